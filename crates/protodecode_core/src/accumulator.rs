/// Text accumulated across one invocation's records, in arrival order.
///
/// Entries are concatenated with no separator, so more than one JSON object
/// in the buffer does not form a single JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBuffer {
    text: String,
    records: usize,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record_text: &str) {
        self.text.push_str(record_text);
        self.records += 1;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of entries appended, including empty ones.
    pub fn records(&self) -> usize {
        self.records
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.text.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_entries_without_separator() {
        let mut buffer = OutputBuffer::new();
        buffer.append(r#"{"id": 1}"#);
        buffer.append("{}");
        buffer.append(r#"{"id": 3}"#);

        assert_eq!(buffer.as_str(), r#"{"id": 1}{}{"id": 3}"#);
        assert_eq!(buffer.records(), 3);
        assert_eq!(buffer.len(), buffer.as_str().len());
    }

    #[test]
    fn new_buffer_is_empty() {
        let buffer = OutputBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.records(), 0);
        assert!(buffer.into_bytes().is_empty());
    }
}
