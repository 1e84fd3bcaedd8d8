//! Human-readable data formatting utilities.
//!
//! Byte sizes use decimal (base-1000) units throughout; file modes are
//! rendered the way `ls -l` prints them.

use humansize::{DECIMAL, FormatSizeOptions, format_size as format_size_human};


/// One kilobyte in decimal units.
const KILO: u64 = 1000;

const SETUID: u32 = 0o4000;
const SETGID: u32 = 0o2000;
const STICKY: u32 = 0o1000;

/// Formats a byte size into a human-readable string using decimal units (kB, MB).
///
/// Sizes below one kilobyte are printed as whole bytes; larger sizes keep one
/// decimal place.
///
/// # Examples
///
/// ```
/// use liblayer::format::format_size;
///
/// assert_eq!(format_size(999), "999 B");
/// assert_eq!(format_size(1000), "1.0 kB");
/// assert_eq!(format_size(1_500_000), "1.5 MB");
/// ```
pub fn format_size(size_bytes: u64) -> String {
    if size_bytes < KILO {
        return format!("{} B", size_bytes);
    }
    let options = FormatSizeOptions::from(DECIMAL)
        .decimal_places(1)
        .decimal_zeroes(1);
    format_size_human(size_bytes, options)
}

/// Kind of an archive entry, as far as mode rendering cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Regular,
    HardLink,
    Symlink,
    CharDevice,
    BlockDevice,
    Fifo,
    Directory,
    Other,
}

impl EntryKind {
    fn mode_char(self) -> char {
        match self {
            EntryKind::Regular | EntryKind::HardLink => '-',
            EntryKind::Symlink => 'l',
            EntryKind::CharDevice => 'c',
            EntryKind::BlockDevice => 'b',
            EntryKind::Fifo => 'p',
            EntryKind::Directory => 'd',
            EntryKind::Other => '?',
        }
    }
}

/// Formats a tar mode into an `ls -l` style permission string.
///
/// # Examples
///
/// ```
/// use liblayer::format::{EntryKind, format_mode};
///
/// assert_eq!(format_mode(0o644, EntryKind::Regular), "-rw-r--r--");
/// assert_eq!(format_mode(0o4755, EntryKind::Regular), "-rwsr-xr-x");
/// assert_eq!(format_mode(0o777, EntryKind::Symlink), "lrwxrwxrwx");
/// ```
pub fn format_mode(mode: u32, kind: EntryKind) -> String {
    let mut out = String::with_capacity(10);
    out.push(kind.mode_char());

    // (read, write, exec) bit for user, group, other, plus the special bit
    // that replaces the exec character in that triple.
    let triples = [
        (0o400, 0o200, 0o100, SETUID, 's'),
        (0o040, 0o020, 0o010, SETGID, 's'),
        (0o004, 0o002, 0o001, STICKY, 't'),
    ];
    for (read, write, exec, special, special_char) in triples {
        out.push(if mode & read != 0 { 'r' } else { '-' });
        out.push(if mode & write != 0 { 'w' } else { '-' });
        let executable = mode & exec != 0;
        out.push(match (mode & special != 0, executable) {
            (true, true) => special_char,
            (true, false) => special_char.to_ascii_uppercase(),
            (false, true) => 'x',
            (false, false) => '-',
        });
    }
    out
}
