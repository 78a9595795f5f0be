//! Front-matter extraction: splits a content file into a YAML header and a
//! markup body.
//!
//! The header must be the first construct in the file: a block delimited by
//! two `---` lines, optionally preceded by blank lines. Anything else makes
//! the whole file body. Once the body begins, further `---` lines are inert.
//! A header that fails to parse as a YAML mapping degrades to "no front
//! matter": its raw text is prepended back onto the body and the build
//! continues. The returned header always contains `layout`.

use serde_yaml::{Mapping, Value as Yaml};

pub const DEFAULT_LAYOUT: &str = "default";

#[derive(Debug)]
pub struct Document {
    pub header: Mapping,
    pub body: String,
}

impl Document {
    /// The page's layout name. Defaults to `default`, also when front matter
    /// supplies a non-string value.
    pub fn layout(&self) -> &str {
        self.header
            .get("layout")
            .and_then(Yaml::as_str)
            .unwrap_or(DEFAULT_LAYOUT)
    }
}

enum State {
    /// Nothing but whitespace seen so far; front matter may still start.
    Seeking,
    /// Between the two delimiter lines, accumulating the header source.
    Header,
    /// Past the header (or the file never had one): everything is body.
    Markup,
}

/// Splits `input` into `(header, body)`. Never fails: malformed front matter
/// degrades to a default header with the raw text kept in the body.
pub fn parse(input: &str) -> Document {
    let mut state = State::Seeking;
    let mut buffer = String::new();
    let mut header_src: Option<String> = None;

    for line in input.split_inclusive('\n') {
        let delimiter = line.trim().starts_with("---");
        match state {
            State::Seeking if delimiter => {
                // Leading blank lines are dropped along with the delimiter.
                buffer.clear();
                state = State::Header;
            }
            State::Seeking => {
                buffer.push_str(line);
                if !line.trim().is_empty() {
                    state = State::Markup;
                }
            }
            State::Header if delimiter => {
                header_src = Some(std::mem::take(&mut buffer));
                state = State::Markup;
            }
            State::Header | State::Markup => buffer.push_str(line),
        }
    }

    let mut header = Mapping::new();
    header.insert("layout".into(), DEFAULT_LAYOUT.into());

    let body = match header_src {
        Some(src) => match serde_yaml::from_str::<Yaml>(&src) {
            Ok(Yaml::Mapping(parsed)) => {
                for (key, value) in parsed {
                    header.insert(key, value);
                }

                buffer
            }
            // Fail open: not a mapping, or not YAML at all.
            _ => src + &buffer,
        },
        None => buffer,
    };

    Document { header, body }
}
