use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::ElementRef;

/// Renders an element's text roughly the way a browser lays it out:
/// whitespace collapses, block elements and `<br>` break lines, and
/// script-like content is dropped.
///
/// An element with no line-breaking markup inside keeps the newlines of its
/// raw text, so plain `Title\nDate\n...` listings still split into lines.
pub fn visible_lines(element: ElementRef<'_>) -> Vec<String> {
    let mut builder = TextBuilder {
        keep_newlines: !element.descendants().skip(1).any(|node| {
            node.value()
                .as_element()
                .is_some_and(|child| breaks_line(child.name()))
        }),
        ..TextBuilder::default()
    };
    for child in element.children() {
        builder.visit_node(child);
    }
    builder
        .out
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Visible text as a single line.
pub fn visible_text(element: ElementRef<'_>) -> String {
    visible_lines(element).join(" ")
}

#[derive(Default)]
struct TextBuilder {
    out: String,
    last_char: Option<char>,
    keep_newlines: bool,
}

fn breaks_line(name: &str) -> bool {
    matches!(
        name,
        "br" | "p" | "div" | "section" | "article" | "header" | "footer" | "nav" | "aside"
            | "main" | "figure" | "figcaption" | "address" | "blockquote" | "li" | "ul"
            | "ol" | "dl" | "dt" | "dd" | "table" | "tr" | "h1" | "h2" | "h3" | "h4"
            | "h5" | "h6"
    )
}

impl TextBuilder {
    fn visit_node(&mut self, node: NodeRef<'_, Node>) {
        match node.value() {
            Node::Text(text) => self.append_text(text),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(node) {
                    self.visit_element(element);
                }
            }
            _ => {}
        }
    }

    fn visit_element(&mut self, element: ElementRef<'_>) {
        match element.value().name() {
            "br" => self.ensure_newline(),
            "script" | "style" | "noscript" | "template" | "iframe" => {}
            name if breaks_line(name) => {
                self.ensure_newline();
                self.visit_children(element);
                self.ensure_newline();
            }
            _ => self.visit_children(element),
        }
    }

    fn visit_children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            self.visit_node(child);
        }
    }

    fn append_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' && self.keep_newlines {
                self.ensure_newline();
            } else if ch.is_whitespace() {
                if matches!(self.last_char, None | Some(' ') | Some('\n')) {
                    continue;
                }
                self.push_char(' ');
            } else {
                self.push_char(ch);
            }
        }
    }

    fn ensure_newline(&mut self) {
        if self.last_char == Some('\n') || self.out.is_empty() {
            return;
        }
        self.push_char('\n');
    }

    fn push_char(&mut self, ch: char) {
        self.out.push(ch);
        self.last_char = Some(ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn lines_of(html: &str) -> Vec<String> {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse(".root").unwrap();
        let root = doc.select(&sel).next().unwrap();
        visible_lines(root)
    }

    #[test]
    fn block_elements_and_breaks_split_lines() {
        let lines = lines_of(
            r#"<div class="root"><h3>Community   Day</h3><span>June 14,</span> <span>2025</span><br><p>Central Park</p></div>"#,
        );
        assert_eq!(lines, vec!["Community Day", "June 14, 2025", "Central Park"]);
    }

    #[test]
    fn scripts_and_blank_lines_are_dropped() {
        let lines = lines_of(
            r#"<div class="root"><script>var x = 1;</script><div>   </div><div>Only</div><style>.a{}</style></div>"#,
        );
        assert_eq!(lines, vec!["Only"]);
    }

    #[test]
    fn raw_newlines_split_lines_without_block_markup() {
        let lines = lines_of("<div class=\"root\">Community Day\n  June 14, 2025\n<b>Central</b> Park\n\n</div>");
        assert_eq!(lines, vec!["Community Day", "June 14, 2025", "Central Park"]);
    }

    #[test]
    fn raw_newlines_collapse_next_to_block_markup() {
        let lines = lines_of("<div class=\"root\">Community\nDay<p>Central Park</p></div>");
        assert_eq!(lines, vec!["Community Day", "Central Park"]);
    }
}
