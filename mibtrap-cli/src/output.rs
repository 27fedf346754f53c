//! Output formatting abstraction for text vs JSON rendering
//!
//! All subcommand output flows through [`OutputWriter`], so command handlers
//! never branch on the format themselves.

use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Writes command payloads as text or JSON.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(&mut handle, payload)
    }

    /// Render a payload to an arbitrary writer.
    pub fn render_to<T: Render + Serialize>(
        &self,
        w: &mut dyn Write,
        payload: &T,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => payload.render_text(w)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Human-readable text rendering.
///
/// Implemented by every CLI output payload alongside `serde::Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Payload {
        name: String,
        records: usize,
    }

    impl Render for Payload {
        fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
            writeln!(w, "{}: {} records", self.name, self.records)
        }
    }

    fn payload() -> Payload {
        Payload {
            name: "CONTOSO-BOARD-MIB".to_owned(),
            records: 4,
        }
    }

    #[test]
    fn text_uses_render() {
        let mut buffer = Vec::new();
        OutputWriter::new(OutputFormat::Text)
            .render_to(&mut buffer, &payload())
            .expect("render should succeed");
        assert_eq!(
            String::from_utf8(buffer).expect("valid UTF-8"),
            "CONTOSO-BOARD-MIB: 4 records\n"
        );
    }

    #[test]
    fn json_uses_serialize() {
        let mut buffer = Vec::new();
        OutputWriter::new(OutputFormat::Json)
            .render_to(&mut buffer, &payload())
            .expect("render should succeed");
        let parsed: serde_json::Value =
            serde_json::from_slice(&buffer).expect("output should be JSON");
        assert_eq!(parsed["records"].as_u64(), Some(4));
        assert_eq!(parsed["name"].as_str(), Some("CONTOSO-BOARD-MIB"));
    }
}
