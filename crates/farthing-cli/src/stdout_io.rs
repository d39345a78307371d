use std::io::{self, Write};

/// Stdout writers that treat a closed pipe as success, so
/// `farthing transactions | head` exits cleanly once the reader goes away.
pub fn write_stdout_text(text: &str) -> io::Result<()> {
    write_bytes(text.as_bytes(), false)
}

pub fn write_stdout_line(text: &str) -> io::Result<()> {
    write_bytes(text.as_bytes(), true)
}

fn write_bytes(bytes: &[u8], trailing_newline: bool) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    tolerate_closed_pipe(stdout.write_all(bytes))?;
    if trailing_newline {
        tolerate_closed_pipe(stdout.write_all(b"\n"))?;
    }
    tolerate_closed_pipe(stdout.flush())
}

fn tolerate_closed_pipe(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}
