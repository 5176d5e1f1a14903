use std::collections::BTreeMap;

/// A single compound selector: `tag`, `#id` and `[attr]` / `[attr="value"]`
/// conditions in any combination. Combinators are not supported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Selector {
    pub fn parse(text: &str) -> Option<Selector> {
        let mut chars = text.trim().chars().peekable();
        let mut selector = Selector::default();
        let mut tag = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_alphanumeric() || c == '-' {
                tag.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if !tag.is_empty() {
            selector.tag = Some(tag.to_ascii_lowercase());
        }

        while let Some(c) = chars.next() {
            match c {
                '#' => {
                    let mut id = String::new();
                    while let Some(&c) = chars.peek() {
                        if c == '#' || c == '[' {
                            break;
                        }
                        id.push(c);
                        chars.next();
                    }
                    if id.is_empty() || selector.id.is_some() {
                        return None;
                    }
                    selector.id = Some(id);
                }
                '[' => {
                    let mut name = String::new();
                    let mut value = None;
                    loop {
                        match chars.next()? {
                            ']' => break,
                            '=' => {
                                value = Some(read_attr_value(&mut chars)?);
                                if chars.next()? != ']' {
                                    return None;
                                }
                                break;
                            }
                            c => name.push(c),
                        }
                    }
                    let name = name.trim().to_string();
                    if name.is_empty() {
                        return None;
                    }
                    selector.attrs.push((name, value));
                }
                _ => return None,
            }
        }

        if selector == Selector::default() {
            return None;
        }
        Some(selector)
    }

    pub fn matches(&self, tag: &str, attrs: &BTreeMap<String, String>) -> bool {
        if let Some(t) = &self.tag {
            if !t.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if attrs.get("id") != Some(id) {
                return false;
            }
        }
        self.attrs.iter().all(|(name, expected)| match (attrs.get(name), expected) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }
}

fn read_attr_value(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let mut value = String::new();
    match chars.peek() {
        Some(&quote) if quote == '"' || quote == '\'' => {
            chars.next();
            loop {
                let c = chars.next()?;
                if c == quote {
                    break;
                }
                value.push(c);
            }
        }
        _ => {
            while let Some(&c) = chars.peek() {
                if c == ']' {
                    break;
                }
                value.push(c);
                chars.next();
            }
        }
    }
    Some(value)
}
