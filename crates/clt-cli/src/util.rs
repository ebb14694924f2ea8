use std::{
    fmt,
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;

/// Destination of a command's output: a file, or stdout when no path is given.
pub struct Output {
    writer: Box<dyn Write>,
    path: Option<PathBuf>,
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}", path.display()),
            None => f.write_str("stdout"),
        }
    }
}

impl Output {
    pub fn create(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self {
                writer: Box::new(io::stdout().lock()),
                path: None,
            });
        };
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Self {
            writer: Box::new(BufWriter::new(file)),
            path: Some(path.to_owned()),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn write_json<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize + ?Sized,
    {
        serde_json::to_writer_pretty(&mut self.writer, value)
            .with_context(|| format!("Failed to write JSON to {self}"))?;
        writeln!(self.writer).with_context(|| format!("Failed to write JSON to {self}"))?;
        self.finish()
    }

    /// Writes a header line followed by one comma-separated line per row.
    pub fn write_csv<I, const N: usize>(&mut self, header: [&str; N], rows: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = [f64; N]>,
    {
        writeln!(self.writer, "{}", header.join(","))
            .with_context(|| format!("Failed to write CSV header to {self}"))?;
        for row in rows {
            let line = row.map(|v| v.to_string()).join(",");
            writeln!(self.writer, "{line}")
                .with_context(|| format!("Failed to write CSV row to {self}"))?;
        }
        self.finish()
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush output to {self}"))
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {file_kind} file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {file_kind} JSON file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("clt-util-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_csv_file() {
        let path = temp_path("rows.csv");
        let mut output = Output::create(Some(path.as_path())).unwrap();
        assert_eq!(output.path(), Some(path.as_path()));
        assert_eq!(output.to_string(), path.display().to_string());
        output
            .write_csv(["x", "y"], [[0.0, 0.25], [1.5, 1.0]])
            .unwrap();
        drop(output);

        let content = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(content, "x,y\n0,0.25\n1.5,1\n");
    }

    #[test]
    fn test_json_file_round_trip() {
        let path = temp_path("values.json");
        Output::create(Some(path.as_path()))
            .unwrap()
            .write_json(&[1.0, 2.5])
            .unwrap();
        let values: Vec<f64> = read_json_file("values", &path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(values, [1.0, 2.5]);
    }

    #[test]
    fn test_read_missing_file() {
        let path = temp_path("missing.json");
        let err = read_json_file::<Vec<f64>, _>("experiment config", &path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to open experiment config file"));
    }

    #[test]
    fn test_stdout_label() {
        let output = Output::create(None).unwrap();
        assert_eq!(output.to_string(), "stdout");
        assert!(output.path().is_none());
    }
}
