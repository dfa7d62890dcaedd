use group_core::domain::NormalizedGroupRecord;
use group_core::ports::{RecordWriter, Result};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// YAML writer adapter implementation
///
/// Renders records as entries of the `groups` list in the groups data file, so the
/// output can be pasted into it directly.
pub struct YamlWriterAdapter {
    output_file: Option<String>,
}

impl YamlWriterAdapter {
    /// Writes to the given file, or to stdout when `output_file` is `None`
    pub fn new(output_file: Option<String>) -> Self {
        Self { output_file }
    }

    /// Single quotes would end the quoted scalar early
    fn quote(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "\""))
    }

    /// Formats records into YAML list entries
    fn format_yaml(&self, records: &[NormalizedGroupRecord]) -> String {
        let mut output = String::new();

        for record in records {
            output.push_str(&format!("    -   name: {}\n", self.quote(&record.name)));
            output.push_str(&format!("        meetup_com_id: {}\n", record.meetup_id));
            output.push_str(&format!("        meetup_com_url: {}\n", self.quote(&record.meetup_url)));
            output.push_str(&format!("        country: {}\n", self.quote(&record.country)));
            output.push('\n');
        }

        output
    }
}

impl RecordWriter for YamlWriterAdapter {
    fn write(&self, records: &[NormalizedGroupRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let yaml = self.format_yaml(records);

        match &self.output_file {
            Some(path) => {
                // Create parent directory if it doesn't exist
                if let Some(parent) = Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)?;
                    }
                }
                fs::write(path, yaml)?;
            }
            None => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(yaml.as_bytes())?;
                stdout.flush()?;
            }
        }

        Ok(())
    }
}
