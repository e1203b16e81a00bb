//! Placeholder templates: `{{name}}` markers in otherwise opaque text.
//!
//! A template is parsed once into alternating literal spans and named
//! fields, then rendered any number of times by streaming the literals and
//! asking a caller-supplied lookup for each field value in source order.
//!
//! Malformed markers are not errors. Anything that fails to parse as
//! `{{` + identifier + `}}` (an empty name, a missing closing marker, a
//! name starting with a digit) is passed through verbatim as literal text.
//! Template authors therefore never need to escape stray braces.

/// Field names start with a letter and continue with letters, digits,
/// `-`, or `_`. Comparison is ordinal and case-sensitive.
fn identifier_len(text: &str, from: usize) -> usize {
    let bytes = text.as_bytes();
    if from >= bytes.len() || !bytes[from].is_ascii_alphabetic() {
        return 0;
    }
    let mut end = from + 1;
    while end < bytes.len()
        && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'-' || bytes[end] == b'_')
    {
        end += 1;
    }
    end - from
}

fn skip_whitespace(text: &str, from: usize) -> usize {
    let bytes = text.as_bytes();
    let mut index = from;
    while index < bytes.len() && matches!(bytes[index], b' ' | b'\t' | b'\r' | b'\n') {
        index += 1;
    }
    index
}

#[derive(Debug)]
struct Field {
    name: String,
    /// Length of the full marker in the source, opening to closing
    /// delimiter inclusive, so rendering can skip it in one hop.
    length: usize,
}

/// A parsed placeholder template.
#[derive(Debug)]
pub struct Template {
    text: String,
    /// Always one longer than `fields`: literal, field, literal, ...
    literal_lengths: Vec<usize>,
    fields: Vec<Field>,
}

impl Template {
    /// Parse with the default `{{` / `}}` markers.
    pub fn parse(text: &str) -> Template {
        Template::parse_with_markers(text, "{{", "}}")
    }

    pub fn parse_with_markers(text: &str, open: &str, close: &str) -> Template {
        let mut literal_lengths = Vec::new();
        let mut fields = Vec::new();
        let mut literal_start = 0;
        let mut index = 0;
        loop {
            let Some(marker) = text[index..].find(open).map(|at| index + at) else {
                literal_lengths.push(text.len() - literal_start);
                break;
            };
            index = marker + open.len();
            index = skip_whitespace(text, index);
            let name_len = identifier_len(text, index);
            if name_len > 0 {
                let name = text[index..index + name_len].to_string();
                index = skip_whitespace(text, index + name_len);
                if text[index..].starts_with(close) {
                    index += close.len();
                    literal_lengths.push(marker - literal_start);
                    fields.push(Field {
                        name,
                        length: index - marker,
                    });
                    literal_start = index;
                }
            }
        }
        let template = Template {
            text: text.to_string(),
            literal_lengths,
            fields,
        };
        template.check_shape();
        template
    }

    /// The recorded spans must tile the source exactly; anything else is a
    /// parser bug, not an input problem.
    fn check_shape(&self) {
        assert_eq!(self.literal_lengths.len(), self.fields.len() + 1);
        let covered: usize = self.literal_lengths.iter().sum::<usize>()
            + self.fields.iter().map(|f| f.length).sum::<usize>();
        assert_eq!(covered, self.text.len(), "template spans do not tile the source");
    }

    /// Regenerate the text, substituting each field with `lookup(name)`.
    /// The lookup is called once per field occurrence, in source order;
    /// mapping unknown names is the caller's business.
    pub fn render(&self, mut lookup: impl FnMut(&str) -> String) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut index = 0;
        for (i, &length) in self.literal_lengths.iter().enumerate() {
            out.push_str(&self.text[index..index + length]);
            index += length;
            if let Some(field) = self.fields.get(i) {
                out.push_str(&lookup(&field.name));
                index += field.length;
            }
        }
        out
    }

    /// Field names in source order (with repetition).
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }
}
