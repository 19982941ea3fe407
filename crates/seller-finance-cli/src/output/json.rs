use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print the result envelope to stdout, newline-terminated.
pub fn print_json(value: &Value) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = write_json(&mut handle, value) {
        eprintln!("failed to write JSON output: {}", e);
    }
}

fn write_json<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_json_is_pretty_and_terminated() {
        let mut buf = Vec::new();
        write_json(&mut buf, &json!({ "balloon_amount": "337068.00" })).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\n  \"balloon_amount\": \"337068.00\"\n}\n"
        );
    }
}
