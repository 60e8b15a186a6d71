use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// Line-oriented question/answer helper over any reader and writer.
///
/// Answers are trimmed. End of input reads as an empty answer, so a closed
/// stdin falls through to every prompt's default.
pub struct Prompter<R, W> {
    reader: R,
    writer: W,
}

impl Prompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Prompter::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Prompter { reader, writer }
    }

    pub fn say(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.writer, "{message}")?;
        self.writer.flush()
    }

    pub fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.writer, "\n{question}\n> ")?;
        self.writer.flush()?;

        let mut answer = String::new();
        self.reader.read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    }

    /// Only `yes` (any case) counts as agreement.
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.ask(&format!("{question} (yes/no)"))?;
        Ok(answer.eq_ignore_ascii_case("yes"))
    }

    pub fn ask_list(&mut self, question: &str) -> io::Result<Vec<String>> {
        let answer = self.ask(question)?;
        Ok(answer.split_whitespace().map(String::from).collect())
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_ask_trims_answer() {
        let mut p = prompter("  ubuntu \n");
        assert_eq!(p.ask("SSH user:").unwrap(), "ubuntu");

        let output = String::from_utf8(p.into_writer()).unwrap();
        assert_eq!(output, "\nSSH user:\n> ");
    }

    #[test]
    fn test_confirm_is_case_insensitive() {
        let mut p = prompter("YES\nno\ny\n");
        assert!(p.confirm("Continue?").unwrap());
        assert!(!p.confirm("Continue?").unwrap());
        assert!(!p.confirm("Continue?").unwrap());
    }

    #[test]
    fn test_end_of_input_is_empty_answer() {
        let mut p = prompter("");
        assert_eq!(p.ask("Anything?").unwrap(), "");
        assert!(!p.confirm("Sure?").unwrap());
    }

    #[test]
    fn test_ask_list_splits_on_whitespace() {
        let mut p = prompter("site.yml   web.yml\tdb.yml\n");
        assert_eq!(
            p.ask_list("Playbooks:").unwrap(),
            vec!["site.yml", "web.yml", "db.yml"]
        );
    }
}
