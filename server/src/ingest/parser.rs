use anyhow::{anyhow, bail, Context};
use log::debug;

/// Instrument export formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectrumFormat {
    /// Instrument export with `#` metadata lines; malformed rows are skipped.
    Esp,
    /// Two numeric columns separated by a comma or whitespace; strict.
    Delimited,
}

impl SpectrumFormat {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_ascii_lowercase();
        if lower.ends_with(".esp") {
            Some(Self::Esp)
        } else if lower.ends_with(".txt") || lower.ends_with(".csv") {
            Some(Self::Delimited)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedSpectrum {
    pub name: String,
    pub frequencies: Vec<f64>,
    pub amplitudes: Vec<f64>,
}

/// Picks the parser from the file extension and decodes the content.
pub fn parse_upload(filename: &str, content: &[u8]) -> anyhow::Result<UploadedSpectrum> {
    if filename.is_empty() {
        bail!("one of the files has no name");
    }
    let format = SpectrumFormat::from_filename(filename)
        .ok_or_else(|| anyhow!("unsupported file type: {}", filename))?;
    let text = std::str::from_utf8(content)
        .with_context(|| format!("file {} is not valid UTF-8", filename))?;

    let (frequencies, amplitudes) = match format {
        SpectrumFormat::Esp => parse_esp(text),
        SpectrumFormat::Delimited => parse_delimited(text)
            .with_context(|| format!("invalid data format in file {}", filename))?,
    };
    debug!("parsed {} rows from {}", frequencies.len(), filename);

    Ok(UploadedSpectrum {
        name: filename.to_string(),
        frequencies,
        amplitudes,
    })
}

pub fn parse_esp(text: &str) -> (Vec<f64>, Vec<f64>) {
    let mut frequencies = Vec::new();
    let mut amplitudes = Vec::new();

    for line in text.lines() {
        if line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if let [freq, ampl] = fields.as_slice() {
            if let (Ok(freq), Ok(ampl)) = (freq.parse::<f64>(), ampl.parse::<f64>()) {
                frequencies.push(freq);
                amplitudes.push(ampl);
            }
        }
    }

    (frequencies, amplitudes)
}

pub fn parse_delimited(text: &str) -> anyhow::Result<(Vec<f64>, Vec<f64>)> {
    let mut frequencies = Vec::new();
    let mut amplitudes = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = if trimmed.contains(',') {
            trimmed.split(',').map(str::trim).collect()
        } else {
            trimmed.split_whitespace().collect()
        };
        let [freq, ampl] = fields.as_slice() else {
            bail!("line {}: expected two columns, found {}", number + 1, fields.len());
        };
        let freq: f64 = freq
            .parse()
            .with_context(|| format!("line {}: bad frequency {:?}", number + 1, freq))?;
        let ampl: f64 = ampl
            .parse()
            .with_context(|| format!("line {}: bad amplitude {:?}", number + 1, ampl))?;
        frequencies.push(freq);
        amplitudes.push(ampl);
    }

    Ok((frequencies, amplitudes))
}
