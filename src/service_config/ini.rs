//! Line-preserving key overrides for service `config.ini` templates.
//!
//! This is not a general INI parser. It recognises section headers
//! and `key = value` lines well enough to overwrite or append the keys the
//! installer owns; every other line, comments included, is kept as written.

/// A template held as lines, edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniTemplate {
    lines: Vec<String>,
    trailing_newline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Section(&'a str),
    Entry(&'a str),
    Other,
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.starts_with(';') || trimmed.starts_with('#') {
        return Line::Other;
    }
    if let Some(name) = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        return Line::Section(name.trim());
    }
    trimmed
        .split_once('=')
        .map_or(Line::Other, |(key, _)| Line::Entry(key.trim()))
}

/// Quotes values the service config reader would otherwise misread.
fn encode_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value != value.trim()
        || value.contains([';', '#', '"', '\\']);
    if !needs_quotes {
        return value.to_owned();
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

impl IniTemplate {
    /// Splits `text` into lines.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.lines().map(ToOwned::to_owned).collect(),
            trailing_newline: text.is_empty() || text.ends_with('\n'),
        }
    }

    /// Returns the range of lines belonging to `section`, header excluded.
    fn section_body(&self, section: &str) -> Option<(usize, usize)> {
        let header = self.lines.iter().position(|line| {
            matches!(classify(line), Line::Section(name) if name.eq_ignore_ascii_case(section))
        })?;
        let start = header + 1;
        let end = self
            .lines
            .iter()
            .skip(start)
            .position(|line| matches!(classify(line), Line::Section(_)))
            .map_or(self.lines.len(), |offset| start + offset);
        Some((start, end))
    }

    /// Sets `key` in `section`, rewriting an existing entry, appending the
    /// entry to the section, or appending the section itself.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let encoded = encode_value(value);
        let Some((start, end)) = self.section_body(section) else {
            if self.lines.last().is_some_and(|line| !line.trim().is_empty()) {
                self.lines.push(String::new());
            }
            self.lines.push(format!("[{section}]"));
            self.lines.push(format!("{key} = {encoded}"));
            return;
        };

        let existing = (start..end).find(|&index| {
            self.lines
                .get(index)
                .is_some_and(|line| matches!(classify(line), Line::Entry(name) if name == key))
        });
        if let Some(line) = existing.and_then(|index| self.lines.get_mut(index)) {
            let indent: String = line.chars().take_while(|ch| ch.is_whitespace()).collect();
            *line = format!("{indent}{key} = {encoded}");
            return;
        }

        let insert_at = (start..end)
            .rev()
            .find(|&index| {
                self.lines
                    .get(index)
                    .is_some_and(|line| !line.trim().is_empty())
            })
            .map_or(start, |index| index + 1);
        self.lines.insert(insert_at, format!("{key} = {encoded}"));
    }

    /// Returns the current value of `key` in `section`, unquoted.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        let (start, end) = self.section_body(section)?;
        self.lines
            .iter()
            .take(end)
            .skip(start)
            .find(|line| matches!(classify(line), Line::Entry(name) if name == key))
            .and_then(|line| line.split_once('='))
            .map(|(_, value)| decode_value(value.trim()))
    }

    /// Joins the lines back into text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut text = self.lines.join("\n");
        if self.trailing_newline && !self.lines.is_empty() {
            text.push('\n');
        }
        text
    }
}

fn decode_value(raw: &str) -> String {
    raw.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .map_or_else(
            || raw.to_owned(),
            |inner| inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        )
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::IniTemplate;

    const TEMPLATE: &str = "\
; Wikifeat users service
[Service]
domainName = example.org
nodeId = xx1
# keep this comment
port = 1

[Database]
dbAddr = 127.0.0.1

[Logger]
logFile = out.log
";

    #[test]
    fn rewrites_existing_keys_and_preserves_everything_else() {
        let mut template = IniTemplate::parse(TEMPLATE);

        template.set("Service", "nodeId", "us1");
        template.set("Service", "port", "4100");

        assert_eq!(
            template.render(),
            TEMPLATE
                .replace("nodeId = xx1", "nodeId = us1")
                .replace("port = 1", "port = 4100")
        );
    }

    #[test]
    fn appends_missing_keys_to_their_section() {
        let mut template = IniTemplate::parse(TEMPLATE);

        template.set("Database", "dbPort", "5984");

        let rendered = template.render();
        assert!(
            rendered.contains("[Database]\ndbAddr = 127.0.0.1\ndbPort = 5984\n\n[Logger]"),
            "{rendered}"
        );
    }

    #[test]
    fn appends_missing_sections_at_the_end() {
        let mut template = IniTemplate::parse(TEMPLATE);

        template.set("Notifications", "mainSiteUrl", "http://localhost:8081");

        assert!(
            template
                .render()
                .ends_with("logFile = out.log\n\n[Notifications]\nmainSiteUrl = http://localhost:8081\n")
        );
    }

    #[rstest]
    #[case::plain("secret", "dbAdminPassword = secret")]
    #[case::comment_marker("p#ss;word", "dbAdminPassword = \"p#ss;word\"")]
    #[case::quote("say \"hi\"", "dbAdminPassword = \"say \\\"hi\\\"\"")]
    #[case::padded(" x ", "dbAdminPassword = \" x \"")]
    fn quotes_values_that_need_it(#[case] value: &str, #[case] expected_line: &str) {
        let mut template = IniTemplate::parse(TEMPLATE);

        template.set("Database", "dbAdminPassword", value);

        assert!(template.render().contains(expected_line));
        assert_eq!(
            template.get("Database", "dbAdminPassword").as_deref(),
            Some(value)
        );
    }

    #[test]
    fn keys_in_other_sections_are_not_touched() {
        let mut template = IniTemplate::parse("[A]\nport = 1\n[B]\nport = 2\n");

        template.set("B", "port", "3");

        assert_eq!(template.render(), "[A]\nport = 1\n[B]\nport = 3\n");
    }
}
