use log::{
    Record,
    kv::{Error, Key, Value, VisitSource},
};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::encode::{Color, Encode, Style, Write};
use serde::Deserialize;
use std::io;

const DEFAULT_PATTERN: &str = "{d} {l} {m}";
const REDACTED: &str = "<redacted>";

#[derive(Debug, Deserialize)]
pub struct KeyValueEncoderConfig {
    pub pattern: Option<String>,
    /// Keys whose values are never printed.
    #[serde(default)]
    pub redact: Vec<String>,
}

/// Pattern encoder that appends the record's key-values as ` key=value`.
///
/// Values containing whitespace or quotes are written as quoted strings so a
/// line stays splittable on spaces.
#[derive(Debug)]
pub struct KeyValueEncoder {
    delegate: PatternEncoder,
    redact: Vec<String>,
}

impl KeyValueEncoder {
    pub fn new(pattern: &str) -> Self {
        Self {
            delegate: PatternEncoder::new(pattern),
            redact: Vec::new(),
        }
    }

    pub fn with_redacted_keys(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.redact.extend(keys.into_iter().map(Into::into));
        self
    }
}

impl Encode for KeyValueEncoder {
    fn encode(&self, w: &mut dyn Write, record: &Record) -> anyhow::Result<()> {
        self.delegate.encode(w, record)?;

        let mut visitor = PairWriter {
            writer: w,
            redact: &self.redact,
            io_err: None,
        };

        if let Err(kv_err) = record.key_values().visit(&mut visitor) {
            if let Some(io_err) = visitor.io_err {
                return Err(io_err.into());
            }
            write!(w, " kv_error={kv_err:?}")?;
        }

        w.write_all(b"\n")?;
        Ok(())
    }
}

struct PairWriter<'a> {
    writer: &'a mut dyn Write,
    redact: &'a [String],
    io_err: Option<io::Error>,
}

impl PairWriter<'_> {
    fn write_pair(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.writer.set_style(Style::new().text(Color::Cyan))?;
        write!(self.writer, " {key}=")?;
        self.writer.set_style(&Style::default())?;

        if self.redact.iter().any(|redacted| redacted == key) {
            write!(self.writer, "{REDACTED}")
        } else if value.is_empty() || value.contains(|c: char| c.is_whitespace() || c == '"') {
            write!(self.writer, "{value:?}")
        } else {
            write!(self.writer, "{value}")
        }
    }
}

impl<'kvs> VisitSource<'kvs> for PairWriter<'_> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), Error> {
        if let Err(e) = self.write_pair(key.as_str(), &value.to_string()) {
            self.io_err = Some(e);
            return Err(Error::msg("io error during visit"));
        }
        Ok(())
    }
}

pub struct KeyValueEncoderDeserializer;

impl log4rs::config::Deserialize for KeyValueEncoderDeserializer {
    type Trait = dyn Encode;
    type Config = KeyValueEncoderConfig;

    fn deserialize(
        &self,
        config: KeyValueEncoderConfig,
        _: &log4rs::config::Deserializers,
    ) -> anyhow::Result<Box<dyn Encode>> {
        let pattern = config.pattern.as_deref().unwrap_or(DEFAULT_PATTERN);
        Ok(Box::new(KeyValueEncoder::new(pattern).with_redacted_keys(config.redact)))
    }
}
