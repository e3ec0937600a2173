use std::{
    fmt::{Display, Formatter},
    ops::{Deref, DerefMut},
};

/// Line-oriented helper for emitting TSPLIB headers and sections.
pub(crate) struct TsplibWriter<'a, 'b>(&'a mut Formatter<'b>);

impl<'a, 'b> Deref for TsplibWriter<'a, 'b> {
    type Target = Formatter<'b>;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl<'a, 'b> DerefMut for TsplibWriter<'a, 'b> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0
    }
}

impl<'a, 'b> TsplibWriter<'a, 'b> {
    pub(crate) fn new(f: &'a mut Formatter<'b>) -> Self {
        Self(f)
    }

    pub(crate) fn line<T: Display>(&mut self, value: T) -> std::fmt::Result {
        writeln!(self, "{value}")
    }

    /// Section header followed by one line per entry; nothing for no entries.
    pub(crate) fn section<T: Display>(&mut self, key: &str, values: &[T]) -> std::fmt::Result {
        if values.is_empty() {
            return Ok(());
        }
        self.line(key)?;
        for val in values {
            self.line(val)?;
        }
        Ok(())
    }

    pub(crate) fn kv<T: Display>(&mut self, key: &str, value: T) -> std::fmt::Result {
        writeln!(self, "{key}: {value}")
    }

    pub(crate) fn opt_kv<T: Display>(&mut self, key: &str, value: Option<T>) -> std::fmt::Result {
        match value {
            Some(value) => self.kv(key, value),
            None => Ok(()),
        }
    }

    /// Space-separated values, wrapped every `per_line` entries.
    pub(crate) fn wrapped<T: Display>(&mut self, values: &[T], per_line: usize) -> std::fmt::Result {
        for chunk in values.chunks(per_line.max(1)) {
            write!(self, "{}", chunk[0])?;
            for value in &chunk[1..] {
                write!(self, " {value}")?;
            }
            self.line("")?;
        }
        Ok(())
    }
}
