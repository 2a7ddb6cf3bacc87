//! Value types for what gets executed: opaque shell commands and concrete process invocations.

/// A shell command supplied by the task author (backup and restore commands).
///
/// The text is handed to a shell verbatim, it is never split, escaped or interpreted here. Whoever
/// writes the task file is responsible for its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand(String);

/// Commands containing this word need a controlling terminal for password prompts
pub const ELEVATION_KEYWORD: &str = "sudo";

impl ShellCommand {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Whether a pseudo-terminal should be allocated when running this command over SSH
    pub fn needs_tty(&self) -> bool {
        self.0.contains(ELEVATION_KEYWORD)
    }
}

impl From<&str> for ShellCommand {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for ShellCommand {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl std::fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A program and its argument vector, exactly as it will be spawned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run `command` through `sh -c` so shell metacharacters behave as written
    pub fn shell(command: &ShellCommand) -> Self {
        Self::new("sh").arg("-c").arg(command.as_str())
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
