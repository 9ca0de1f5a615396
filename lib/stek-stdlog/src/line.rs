/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt::Arguments;
use std::io::{self, Write};

use anstyle::{AnsiColor, Color, Style};
use chrono::{DateTime, Local};
use slog::{KV, Level, OwnedKVList, Record};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const STYLE_BOLD: Style = Style::new().bold();
const STYLE_DIMMED: Style = Style::new().dimmed();

#[derive(Default)]
struct FieldCollector(Vec<(String, String)>);

impl slog::Serializer for FieldCollector {
    fn emit_arguments(&mut self, key: slog::Key, val: &Arguments) -> slog::Result {
        self.0.push((key.to_string(), val.to_string()));
        Ok(())
    }
}

pub(crate) struct LogLine {
    time: DateTime<Local>,
    level: Level,
    message: String,
    fields: Vec<(String, String)>,
    location: Option<(&'static str, u32)>,
}

impl LogLine {
    pub(crate) fn new(
        record: &Record,
        logger_values: &OwnedKVList,
        with_location: bool,
    ) -> Result<Self, slog::Error> {
        let mut collector = FieldCollector::default();
        logger_values.serialize(record, &mut collector)?;
        record.kv().serialize(record, &mut collector)?;

        Ok(LogLine {
            time: Local::now(),
            level: record.level(),
            message: record.msg().to_string(),
            fields: collector.0,
            location: with_location.then(|| (record.module(), record.line())),
        })
    }

    /// A line reporting records lost since the last write.
    pub(crate) fn dropped_notice(count: u64) -> Self {
        LogLine {
            time: Local::now(),
            level: Level::Warning,
            message: format!("{count} log records dropped"),
            fields: Vec::new(),
            location: None,
        }
    }

    fn message(&self) -> &str {
        if self.message.is_empty() {
            "()"
        } else {
            &self.message
        }
    }

    pub(crate) fn write_plain(&self, buf: &mut Vec<u8>) -> io::Result<()> {
        write!(buf, "{} {}", self.time.format(TIME_FORMAT), self.level)?;
        for (k, v) in &self.fields {
            write!(buf, " {k}={v},")?;
        }
        write!(buf, " {}", self.message())?;
        if let Some((module, line)) = self.location {
            write!(buf, " <{module}:{line}>")?;
        }
        writeln!(buf)
    }

    pub(crate) fn write_styled(&self, buf: &mut Vec<u8>) -> io::Result<()> {
        let level_style = level_style(self.level);
        write!(
            buf,
            "{} {}{}{}",
            self.time.format(TIME_FORMAT),
            level_style.render(),
            self.level,
            level_style.render_reset(),
        )?;
        for (k, v) in &self.fields {
            write!(
                buf,
                " {}{k}{}={v},",
                STYLE_BOLD.render(),
                STYLE_BOLD.render_reset()
            )?;
        }
        write!(
            buf,
            " {}{}{}",
            STYLE_BOLD.render(),
            self.message(),
            STYLE_BOLD.render_reset()
        )?;
        if let Some((module, line)) = self.location {
            write!(
                buf,
                " {}<{module}:{line}>{}",
                STYLE_DIMMED.render(),
                STYLE_DIMMED.render_reset()
            )?;
        }
        writeln!(buf)
    }
}

fn level_style(level: Level) -> Style {
    let color = match level {
        Level::Critical => AnsiColor::Magenta,
        Level::Error => AnsiColor::Red,
        Level::Warning => AnsiColor::Yellow,
        Level::Info => AnsiColor::Green,
        Level::Debug => AnsiColor::Cyan,
        Level::Trace => AnsiColor::Blue,
    };
    Style::new().fg_color(Some(Color::Ansi(color)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handshake_line() -> LogLine {
        LogLine {
            time: Local::now(),
            level: Level::Info,
            message: "tls handshake done".to_string(),
            fields: vec![
                ("peer".to_string(), "127.0.0.1:50432".to_string()),
                ("resumed".to_string(), "true".to_string()),
            ],
            location: Some(("stek_server::serve", 57)),
        }
    }

    #[test]
    fn plain() {
        let mut buf = Vec::new();
        handshake_line().write_plain(&mut buf).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.ends_with(
            " INFO peer=127.0.0.1:50432, resumed=true, tls handshake done \
             <stek_server::serve:57>\n"
        ));
    }

    #[test]
    fn styled() {
        let mut buf = Vec::new();
        handshake_line().write_styled(&mut buf).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.contains(&format!(
            "{}INFO{}",
            level_style(Level::Info).render(),
            level_style(Level::Info).render_reset()
        )));
        assert!(s.contains("tls handshake done"));
        assert!(s.ends_with('\n'));
    }

    #[test]
    fn empty_message() {
        let mut line = handshake_line();
        line.message.clear();
        line.fields.clear();
        line.location = None;
        let mut buf = Vec::new();
        line.write_plain(&mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().ends_with(" INFO ()\n"));
    }

    #[test]
    fn dropped() {
        let mut buf = Vec::new();
        LogLine::dropped_notice(3).write_plain(&mut buf).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.ends_with(" WARN 3 log records dropped\n"));
    }
}
