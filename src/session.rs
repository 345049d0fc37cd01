//! One interactive passman session: unlock, show the menu, run one action.

use std::path::PathBuf;

use zeroize::Zeroizing;

use crate::console::Console;
use crate::crypto::KdfParams;
use crate::echo::MaskedInput;
use crate::error::SessionError;
use crate::store::CredentialStore;

pub const PASSWORD_PROMPT: &str = "Enter your database password:";
pub const MENU_PROMPT: &str = "What do you want to do:";

/// A parsed menu selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Add,
    Get,
    Quit,
    Invalid,
}

impl MenuChoice {
    /// Maps the user's input to an action. Get only exists for a store that
    /// was initialised by an earlier session.
    pub fn parse(input: &str, store_existed: bool) -> Self {
        match input.trim().parse::<u32>() {
            Ok(1) => MenuChoice::Add,
            Ok(2) if store_existed => MenuChoice::Get,
            Ok(3) => MenuChoice::Quit,
            _ => MenuChoice::Invalid,
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Saved(i64),
    Shown(i64),
    Quit,
    NotFound(i64),
    InvalidId(String),
    InvalidOption,
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Saved(_) | Outcome::Shown(_) | Outcome::Quit => 0,
            Outcome::NotFound(_) | Outcome::InvalidId(_) | Outcome::InvalidOption => 1,
        }
    }
}

pub struct SessionOptions {
    pub path: PathBuf,
    pub password: Option<Zeroizing<String>>,
    pub kdf: KdfParams,
}

impl SessionOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            password: None,
            kdf: KdfParams::default(),
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Zeroizing::new(password.into()));
        self
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }
}

/// Runs a complete session against `console`.
pub fn run<C: Console>(console: &mut C, options: SessionOptions) -> Result<Outcome, SessionError> {
    let SessionOptions {
        path,
        password,
        kdf,
    } = options;

    let password = match password {
        Some(password) => password,
        None => {
            console.prompt(PASSWORD_PROMPT)?;
            let secret = read_secret(console)?;
            console.println("")?;
            secret
        }
    };
    if password.is_empty() {
        return Err(SessionError::EmptyPassword);
    }

    let mut store = CredentialStore::open_with_params(&path, &password, kdf)?;
    drop(password);

    let store_existed = store.records_table_exists();
    store.ensure_schema()?;
    log::debug!(
        "Session on {} (existing store: {})",
        store.path().display(),
        store_existed
    );

    console.println(" 1. Add password")?;
    if store_existed {
        console.println(" 2. Get password")?;
    }
    console.println(" 3. Quit")?;
    console.prompt(MENU_PROMPT)?;
    let input = read_line(console)?;

    match MenuChoice::parse(&input, store_existed) {
        MenuChoice::Add => add_password(console, &mut store),
        MenuChoice::Get => get_password(console, &store),
        MenuChoice::Quit => {
            console.println("Bye")?;
            Ok(Outcome::Quit)
        }
        MenuChoice::Invalid => {
            log::debug!("Invalid menu choice");
            console.eprintln("Invalid option")?;
            Ok(Outcome::InvalidOption)
        }
    }
}

fn add_password<C: Console>(
    console: &mut C,
    store: &mut CredentialStore,
) -> Result<Outcome, SessionError> {
    let site = loop {
        console.prompt("Enter site name:")?;
        let site = read_line(console)?;
        let site = site.trim();
        if !site.is_empty() {
            break site.to_string();
        }
        console.eprintln("Site name cannot be empty")?;
    };

    let pass = loop {
        console.prompt("Enter password:")?;
        let pass = read_secret(console)?;
        if !pass.is_empty() {
            break pass;
        }
        console.println("")?;
        console.eprintln("Password cannot be empty")?;
    };

    let id = store.insert(&site, &pass)?;
    console.println("")?;
    console.println(&format!("Password saved successfully id:{}", id))?;
    console.println("Bye")?;
    Ok(Outcome::Saved(id))
}

fn get_password<C: Console>(
    console: &mut C,
    store: &CredentialStore,
) -> Result<Outcome, SessionError> {
    for entry in store.list_all() {
        console.println(&format!(" {}. {}", entry.id, entry.site))?;
    }
    console.prompt("Enter site:")?;
    let input = read_line(console)?;
    let input = input.trim();

    let id = match input.parse::<i64>() {
        Ok(id) => id,
        Err(_) => {
            console.eprintln(&format!("invalid id '{}'", input))?;
            return Ok(Outcome::InvalidId(input.to_string()));
        }
    };

    match store.get_by_id(id) {
        Some(record) => {
            log::info!("Retrieved record {}", id);
            console.println(&format!("pass: {}", record.pass()))?;
            Ok(Outcome::Shown(id))
        }
        None => {
            log::debug!("No record with id {}", id);
            console.eprintln(&format!("no site with id {}", id))?;
            Ok(Outcome::NotFound(id))
        }
    }
}

fn read_line<C: Console>(console: &mut C) -> Result<String, SessionError> {
    console.read_line()?.ok_or(SessionError::EndOfInput)
}

fn read_secret<C: Console>(console: &mut C) -> Result<Zeroizing<String>, SessionError> {
    match console.read_secret()? {
        MaskedInput::Line(secret) => Ok(secret),
        MaskedInput::Eof => Err(SessionError::EndOfInput),
        MaskedInput::Cancelled => Err(SessionError::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;
    use tempfile::TempDir;

    /// Console fed from a script of input lines that records everything
    /// printed.
    struct ScriptedConsole {
        input: VecDeque<String>,
        secret_cancelled: bool,
        out: String,
        err: String,
    }

    impl ScriptedConsole {
        fn new(lines: &[&str]) -> Self {
            Self {
                input: lines.iter().map(|s| s.to_string()).collect(),
                secret_cancelled: false,
                out: String::new(),
                err: String::new(),
            }
        }
    }

    impl Console for ScriptedConsole {
        fn prompt(&mut self, text: &str) -> io::Result<()> {
            self.out.push_str(text);
            Ok(())
        }

        fn println(&mut self, line: &str) -> io::Result<()> {
            self.out.push_str(line);
            self.out.push('\n');
            Ok(())
        }

        fn eprintln(&mut self, line: &str) -> io::Result<()> {
            self.err.push_str(line);
            self.err.push('\n');
            Ok(())
        }

        fn read_line(&mut self) -> io::Result<Option<String>> {
            Ok(self.input.pop_front())
        }

        fn read_secret(&mut self) -> io::Result<MaskedInput> {
            if self.secret_cancelled {
                return Ok(MaskedInput::Cancelled);
            }
            Ok(match self.input.pop_front() {
                Some(line) => MaskedInput::Line(Zeroizing::new(line)),
                None => MaskedInput::Eof,
            })
        }
    }

    fn options(dir: &TempDir) -> SessionOptions {
        SessionOptions::new(dir.path().join("passwords.db"))
            .with_password("master")
            .with_kdf(KdfParams::minimal())
    }

    fn run_script(dir: &TempDir, lines: &[&str]) -> (Outcome, ScriptedConsole) {
        let mut console = ScriptedConsole::new(lines);
        let outcome = run(&mut console, options(dir)).expect("session failed");
        (outcome, console)
    }

    #[test]
    fn test_menu_choice_parse() {
        assert_eq!(MenuChoice::parse("1", false), MenuChoice::Add);
        assert_eq!(MenuChoice::parse(" 3 ", false), MenuChoice::Quit);
        assert_eq!(MenuChoice::parse("2", true), MenuChoice::Get);
        assert_eq!(MenuChoice::parse("2", false), MenuChoice::Invalid);
        assert_eq!(MenuChoice::parse("4", true), MenuChoice::Invalid);
        assert_eq!(MenuChoice::parse("0", true), MenuChoice::Invalid);
        assert_eq!(MenuChoice::parse("add", true), MenuChoice::Invalid);
        assert_eq!(MenuChoice::parse("", true), MenuChoice::Invalid);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Saved(1).exit_code(), 0);
        assert_eq!(Outcome::Shown(1).exit_code(), 0);
        assert_eq!(Outcome::Quit.exit_code(), 0);
        assert_eq!(Outcome::NotFound(9).exit_code(), 1);
        assert_eq!(Outcome::InvalidId("x".into()).exit_code(), 1);
        assert_eq!(Outcome::InvalidOption.exit_code(), 1);
    }

    #[test]
    fn test_add_then_get() {
        let dir = TempDir::new().unwrap();

        let (outcome, console) = run_script(&dir, &["1", "example.com", "hunter2"]);
        assert_eq!(outcome, Outcome::Saved(1));
        assert!(console.out.contains("Password saved successfully id:1"));
        assert!(!console.out.contains("hunter2"));

        let (outcome, console) = run_script(&dir, &["2", "1"]);
        assert_eq!(outcome, Outcome::Shown(1));
        assert!(console.out.contains(" 1. example.com\n"));
        assert!(console.out.contains("pass: hunter2\n"));
    }

    #[test]
    fn test_fresh_store_hides_get() {
        let dir = TempDir::new().unwrap();

        let (outcome, console) = run_script(&dir, &["2"]);
        assert_eq!(outcome, Outcome::InvalidOption);
        assert!(console.out.contains(" 1. Add password\n"));
        assert!(!console.out.contains("Get password"));
        assert!(console.out.contains(" 3. Quit\n"));
        assert_eq!(console.err, "Invalid option\n");
    }

    #[test]
    fn test_existing_empty_store_offers_get() {
        let dir = TempDir::new().unwrap();
        run_script(&dir, &["3"]);

        let (outcome, console) = run_script(&dir, &["2", "1"]);
        assert!(console.out.contains(" 2. Get password\n"));
        assert_eq!(outcome, Outcome::NotFound(1));
    }

    #[test]
    fn test_get_missing_id() {
        let dir = TempDir::new().unwrap();
        run_script(&dir, &["1", "example.com", "hunter2"]);

        let (outcome, console) = run_script(&dir, &["2", "42"]);
        assert_eq!(outcome, Outcome::NotFound(42));
        assert_eq!(console.err, "no site with id 42\n");
        assert!(!console.out.contains("pass:"));
    }

    #[test]
    fn test_get_non_numeric_id() {
        let dir = TempDir::new().unwrap();
        run_script(&dir, &["1", "example.com", "hunter2"]);

        let (outcome, console) = run_script(&dir, &["2", "example.com"]);
        assert_eq!(outcome, Outcome::InvalidId("example.com".to_string()));
        assert!(console.err.contains("invalid id 'example.com'"));
    }

    #[test]
    fn test_quit() {
        let dir = TempDir::new().unwrap();
        let (outcome, console) = run_script(&dir, &["3"]);
        assert_eq!(outcome, Outcome::Quit);
        assert!(console.out.ends_with("Bye\n"));
    }

    #[test]
    fn test_prompts_for_password_when_not_given() {
        let dir = TempDir::new().unwrap();
        let mut console = ScriptedConsole::new(&["master", "3"]);
        let options = SessionOptions::new(dir.path().join("passwords.db"))
            .with_kdf(KdfParams::minimal());

        let outcome = run(&mut console, options).unwrap();
        assert_eq!(outcome, Outcome::Quit);
        assert!(console.out.starts_with(PASSWORD_PROMPT));
    }

    #[test]
    fn test_empty_password_rejected() {
        let dir = TempDir::new().unwrap();
        let mut console = ScriptedConsole::new(&["", "3"]);
        let options = SessionOptions::new(dir.path().join("passwords.db"))
            .with_kdf(KdfParams::minimal());

        let err = run(&mut console, options).unwrap_err();
        assert!(matches!(err, SessionError::EmptyPassword));
        assert!(!dir.path().join("passwords.db").exists());
    }

    #[test]
    fn test_cancelled_password_entry() {
        let dir = TempDir::new().unwrap();
        let mut console = ScriptedConsole::new(&[]);
        console.secret_cancelled = true;
        let options = SessionOptions::new(dir.path().join("passwords.db"))
            .with_kdf(KdfParams::minimal());

        let err = run(&mut console, options).unwrap_err();
        assert!(matches!(err, SessionError::Cancelled));
    }

    #[test]
    fn test_end_of_input_at_menu() {
        let dir = TempDir::new().unwrap();
        let mut console = ScriptedConsole::new(&[]);
        let err = run(&mut console, options(&dir)).unwrap_err();
        assert!(matches!(err, SessionError::EndOfInput));
    }

    #[test]
    fn test_wrong_password_fails_session() {
        let dir = TempDir::new().unwrap();
        run_script(&dir, &["1", "example.com", "hunter2"]);

        let mut console = ScriptedConsole::new(&["2", "1"]);
        let options = SessionOptions::new(dir.path().join("passwords.db"))
            .with_password("not the master")
            .with_kdf(KdfParams::minimal());
        let err = run(&mut console, options).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Store(crate::error::StoreError::Authentication { .. })
        ));
        assert!(!console.out.contains("Add password"));
    }

    #[test]
    fn test_empty_site_and_password_are_asked_again() {
        let dir = TempDir::new().unwrap();
        let (outcome, console) = run_script(&dir, &["1", "", "   ", "example.com", "", "hunter2"]);
        assert_eq!(outcome, Outcome::Saved(1));
        assert_eq!(console.out.matches("Enter site name:").count(), 3);
        assert_eq!(console.out.matches("Enter password:").count(), 2);
        assert_eq!(
            console.err,
            "Site name cannot be empty\nSite name cannot be empty\nPassword cannot be empty\n"
        );

        let (_, console) = run_script(&dir, &["2", "1"]);
        assert!(console.out.contains(" 1. example.com\n"));
        assert!(console.out.contains("pass: hunter2\n"));
    }

    #[test]
    fn test_end_of_input_while_site_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut console = ScriptedConsole::new(&["1", ""]);
        let err = run(&mut console, options(&dir)).unwrap_err();
        assert!(matches!(err, SessionError::EndOfInput));
    }

    #[test]
    fn test_site_is_trimmed_password_is_not() {
        let dir = TempDir::new().unwrap();
        run_script(&dir, &["1", "  my site  ", " spaced pass "]);

        let (_, console) = run_script(&dir, &["2", "1"]);
        assert!(console.out.contains(" 1. my site\n"));
        assert!(console.out.contains("pass:  spaced pass \n"));
    }
}
