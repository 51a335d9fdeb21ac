/// Line-oriented text buffer for generated Rust.
///
/// Indentation follows braces: a line starting with `}` closes a level before it is
/// written, a line ending with `{` opens one after. Temporaries come from
/// [`CodeWriter::fresh`] so nested expansions never shadow each other.
#[derive(Debug, Default)]
pub struct CodeWriter {
    buf: String,
    indent: usize,
    next_id: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref().trim();
        if text.is_empty() {
            self.buf.push('\n');
            return;
        }
        if text.starts_with('}') {
            self.indent = self.indent.saturating_sub(1);
        }
        for _ in 0..self.indent {
            self.buf.push_str("    ");
        }
        self.buf.push_str(text);
        self.buf.push('\n');
        if text.ends_with('{') {
            self.indent += 1;
        }
    }

    /// Writes a multi-line block, re-indenting every line.
    pub fn lines(&mut self, block: &str) {
        for line in block.lines() {
            self.line(line);
        }
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// A variable name not used before in this buffer: `items_0`, `items_1`, ...
    pub fn fresh(&mut self, stem: &str) -> String {
        let id = self.next_id;
        self.next_id += 1;
        format!("{stem}_{id}")
    }

    pub fn append(&mut self, other: CodeWriter) {
        self.buf.push_str(&other.buf);
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn braces_drive_indentation() {
        let mut out = CodeWriter::new();
        out.line("if x {");
        out.line("y();");
        out.line("} else {");
        out.line("z();");
        out.line("}");
        assert_eq!(out.as_str(), "if x {\n    y();\n} else {\n    z();\n}\n");
    }

    #[test]
    fn fresh_names_never_repeat() {
        let mut out = CodeWriter::new();
        assert_eq!(out.fresh("items"), "items_0");
        assert_eq!(out.fresh("element"), "element_1");
        assert_eq!(out.fresh("items"), "items_2");
    }
}
