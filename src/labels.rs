//! Class names and their display colors.

use crate::error::{Result, SegError};
use image::Rgb;
use rand_mt::Mt;
use std::fs;
use std::path::Path;

/// Seed for the default color stream. Changing it changes every generated palette.
pub const DEFAULT_COLOR_SEED: u32 = 42;

/// Ordered class names; the line number in the classes file is the class index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTable {
    names: Vec<String>,
}

impl ClassTable {
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(SegError::config("class table must contain at least one class"));
        }
        Ok(Self { names })
    }

    /// Load one class name per line. Surrounding blank lines are ignored.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SegError::config("classes file is empty"));
        }
        Self::new(trimmed.lines().map(|l| l.trim().to_string()).collect())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Class table paired with one RGB color per class, index-aligned.
///
/// Colors files are read as `R,G,B`. Files written for tools that fill BGR buffers directly
/// need their first and last columns swapped to render the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    classes: ClassTable,
    colors: Vec<Rgb<u8>>,
}

impl Palette {
    pub fn new(classes: ClassTable, colors: Vec<Rgb<u8>>) -> Result<Self> {
        if colors.len() != classes.len() {
            return Err(SegError::ClassCountMismatch {
                source_name: "colors file".to_string(),
                expected: classes.len(),
                actual: colors.len(),
            });
        }
        Ok(Self { classes, colors })
    }

    /// Palette from the seeded default color stream, class 0 black.
    pub fn with_default_colors(classes: ClassTable) -> Self {
        let colors = default_colors(classes.len());
        Self { classes, colors }
    }

    /// Load colors from `colors_path` if given, otherwise generate the defaults.
    pub fn load<P: AsRef<Path>>(classes: ClassTable, colors_path: Option<P>) -> Result<Self> {
        match colors_path {
            Some(path) => {
                let colors = load_colors(path.as_ref())?;
                Self::new(classes, colors)
            }
            None => Ok(Self::with_default_colors(classes)),
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    pub fn colors(&self) -> &[Rgb<u8>] {
        &self.colors
    }

    pub fn color(&self, index: usize) -> Option<Rgb<u8>> {
        self.colors.get(index).copied()
    }

    /// (name, color) pairs in class order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Rgb<u8>)> {
        self.classes.iter().zip(self.colors.iter().copied())
    }
}

/// Parse an `R,G,B`-per-line colors file.
pub fn load_colors(path: &Path) -> Result<Vec<Rgb<u8>>> {
    let text = read_to_string(path)?;
    parse_colors(&text, path)
}

fn parse_colors(text: &str, path: &Path) -> Result<Vec<Rgb<u8>>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SegError::config(format!(
            "colors file {} is empty",
            path.display()
        )));
    }

    trimmed
        .lines()
        .enumerate()
        .map(|(i, line)| {
            parse_color_line(line).ok_or_else(|| SegError::ColorParse {
                path: path.to_path_buf(),
                line: i + 1,
                content: line.to_string(),
            })
        })
        .collect()
}

fn parse_color_line(line: &str) -> Option<Rgb<u8>> {
    let mut channels = [0u8; 3];
    let mut parts = line.split(',');
    for channel in channels.iter_mut() {
        *channel = parts.next()?.trim().parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(Rgb(channels))
}

/// Deterministic colors for `class_count` classes.
///
/// Bytes are drawn from an MT19937 stream seeded with [`DEFAULT_COLOR_SEED`], four per 32-bit
/// output (low byte first), rejecting 255 so every channel is uniform in `[0, 255)`.
pub fn default_colors(class_count: usize) -> Vec<Rgb<u8>> {
    let mut colors = Vec::with_capacity(class_count);
    if class_count == 0 {
        return colors;
    }
    colors.push(Rgb([0, 0, 0]));

    let mut bytes = ByteStream::new(DEFAULT_COLOR_SEED);
    for _ in 1..class_count {
        let r = bytes.next_below_255();
        let g = bytes.next_below_255();
        let b = bytes.next_below_255();
        colors.push(Rgb([r, g, b]));
    }
    colors
}

struct ByteStream {
    rng: Mt,
    buf: u32,
    remaining: u8,
}

impl ByteStream {
    fn new(seed: u32) -> Self {
        Self {
            rng: Mt::new(seed),
            buf: 0,
            remaining: 0,
        }
    }

    fn next_byte(&mut self) -> u8 {
        if self.remaining == 0 {
            self.buf = self.rng.next_u32();
            self.remaining = 3;
        } else {
            self.buf >>= 8;
            self.remaining -= 1;
        }
        (self.buf & 0xff) as u8
    }

    fn next_below_255(&mut self) -> u8 {
        loop {
            let value = self.next_byte();
            if value < 255 {
                return value;
            }
        }
    }
}

fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| SegError::Io {
        path: path.to_path_buf(),
        source,
    })
}
