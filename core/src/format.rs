//! Bounded formatting of combos into compiler command lines.

use std::fmt::{self, Write};

use crate::combo::ComboHandle;
use crate::error::{ComboError, FormatError};

/// `fmt::Write` sink over a caller-supplied buffer.
///
/// Writes stop at the buffer's end; `needed` keeps counting so the caller
/// can report how large the buffer would have to be.
struct BoundedWriter<'b> {
    buf: &'b mut [u8],
    len: usize,
    needed: usize,
}

impl<'b> BoundedWriter<'b> {
    fn new(buf: &'b mut [u8]) -> Self {
        Self {
            buf,
            len: 0,
            needed: 0,
        }
    }

    fn finish(self) -> Result<usize, FormatError> {
        if self.needed > self.buf.len() {
            Err(FormatError::Truncated {
                needed: self.needed,
                capacity: self.buf.len(),
            })
        } else {
            Ok(self.len)
        }
    }
}

impl Write for BoundedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.needed += s.len();
        if self.len < self.buf.len() {
            let take = s.len().min(self.buf.len() - self.len);
            self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
            self.len += take;
        }
        Ok(())
    }
}

/// Run `body` against a bounded writer over `buf`.
fn write_bounded(
    buf: &mut [u8],
    body: impl FnOnce(&mut BoundedWriter<'_>) -> Result<(), ComboError>,
) -> Result<usize, FormatError> {
    let mut writer = BoundedWriter::new(buf);
    body(&mut writer)?;
    writer.finish()
}

/// Same as [`write_bounded`], into a growable string.
fn write_string(
    body: impl FnOnce(&mut String) -> Result<(), ComboError>,
) -> Result<String, ComboError> {
    let mut out = String::new();
    body(&mut out)?;
    Ok(out)
}

impl ComboHandle<'_> {
    fn write_command(&self, out: &mut impl Write) -> Result<(), ComboError> {
        let info = self.entry_info()?;
        let combo = self.combo_num()?;

        // Writers above never fail, so fmt errors cannot occur
        let _ = write!(
            out,
            "{} /DCENTROIDMASK={} /DSHADERCOMBO={:x} /DSHADER_MODEL_{}=1 /T{} /Emain",
            info.shader_file_name,
            info.centroid_mask,
            combo,
            info.shader_version.to_ascii_uppercase(),
            info.shader_version,
        );
        for (name, value) in self.static_values()?.chain(self.dynamic_values()?) {
            let _ = write!(out, " /D{name}={value}");
        }
        Ok(())
    }

    fn write_human_readable(&self, out: &mut impl Write) -> Result<(), ComboError> {
        let info = self.entry_info()?;

        let _ = write!(
            out,
            "{} ({}, {}) combo {} [command {}]: static(",
            info.name,
            info.shader_file_name,
            info.shader_version,
            self.combo_num()?,
            self.command_num()?,
        );
        write_params(out, self.static_values()?);
        let _ = out.write_str(") dynamic(");
        write_params(out, self.dynamic_values()?);
        let _ = out.write_str(")");
        if info.centroid_mask != 0 {
            let _ = write!(out, " centroid=0x{:x}", info.centroid_mask);
        }
        Ok(())
    }

    /// Write the compiler command line for this combo into `buf`.
    ///
    /// Returns the number of bytes written. Fails with
    /// [`FormatError::Truncated`] when `buf` is too small; nothing is ever
    /// written past its end.
    pub fn format_command(&self, buf: &mut [u8]) -> Result<usize, FormatError> {
        write_bounded(buf, |out| self.write_command(out))
    }

    /// Write a developer-facing description of this combo into `buf`.
    pub fn format_command_human_readable(&self, buf: &mut [u8]) -> Result<usize, FormatError> {
        write_bounded(buf, |out| self.write_human_readable(out))
    }

    /// Compiler command line as an owned string.
    pub fn command_line(&self) -> Result<String, ComboError> {
        write_string(|out| self.write_command(out))
    }

    /// Human-readable description as an owned string.
    pub fn description(&self) -> Result<String, ComboError> {
        write_string(|out| self.write_human_readable(out))
    }
}

fn write_params<'p>(out: &mut impl Write, params: impl Iterator<Item = (&'p str, i32)>) {
    for (index, (name, value)) in params.enumerate() {
        let separator = if index == 0 { "" } else { " " };
        let _ = write!(out, "{separator}{name}={value}");
    }
}
