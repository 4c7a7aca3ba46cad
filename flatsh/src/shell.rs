// SPDX-License-Identifier: MIT

use std::io::{BufRead, Write};

use flatfs::flat::*;
use flatfs::{is_absolute, join_paths};

pub const PROMPT: &str = "flatfs$ ";
const EOF_MARKER: &str = "EOF";

const HELP: &str = "\
The following commands are supported:
  ls [<directory>]        list directory content
  cat <path>              show file content
  touch <path>            create an empty file
  edit <path>             replace file content (end input with a line 'EOF')
  rm <path>               remove a file
  mkdir <path>            create a directory
  rmdir <path>            remove an empty directory
  mv <old> <new>          rename an entry within its directory
  df                      show block and table usage
  fsck                    check volume consistency
  format                  erase the volume
  help                    show this help message
  exit                    leave the shell
";

/// One parsed command line.
#[derive(Debug, PartialEq, Eq)]
enum Command<'l> {
    List(String),
    Cat(String),
    Touch(String),
    Edit(String),
    Remove(String),
    MakeDir(String),
    RemoveDir(String),
    Move(String, String),
    Usage,
    Check,
    Format,
    Help,
    Exit,
    Unknown(&'l str),
}

impl<'l> Command<'l> {
    /// Parses a non-empty line. `Err` carries the usage line to print.
    fn parse(line: &'l str) -> Result<Option<Self>, &'static str> {
        let args: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, rest)) = args.split_first() else {
            return Ok(None);
        };

        let one = |usage: &'static str| match rest {
            [path] => Ok(rooted(path)),
            _ => Err(usage),
        };
        let none = |usage: &'static str| match rest {
            [] => Ok(()),
            _ => Err(usage),
        };

        let cmd = match name {
            "ls" => match rest {
                [] => Command::List("/".into()),
                [path] => Command::List(rooted(path)),
                _ => return Err("Usage: ls [<directory>]"),
            },
            "cat" => Command::Cat(one("Usage: cat <path>")?),
            "touch" => Command::Touch(one("Usage: touch <path>")?),
            "edit" => Command::Edit(one("Usage: edit <path>")?),
            "rm" => Command::Remove(one("Usage: rm <path>")?),
            "mkdir" => Command::MakeDir(one("Usage: mkdir <directory_path>")?),
            "rmdir" => Command::RemoveDir(one("Usage: rmdir <directory_path>")?),
            "mv" => match rest {
                [old, new] => Command::Move(rooted(old), rooted(new)),
                _ => return Err("Usage: mv <old_path> <new_path>"),
            },
            "df" => none("Usage: df").map(|_| Command::Usage)?,
            "fsck" => none("Usage: fsck").map(|_| Command::Check)?,
            "format" => none("Usage: format").map(|_| Command::Format)?,
            "help" => Command::Help,
            "exit" => Command::Exit,
            other => Command::Unknown(other),
        };
        Ok(Some(cmd))
    }
}

/// Arguments without a leading `/` are taken from the root.
fn rooted(arg: &str) -> String {
    if is_absolute(arg) {
        arg.to_string()
    } else {
        join_paths("/", arg)
    }
}

/// Interactive loop over a mounted volume.
///
/// Reads commands from `input` and writes every response to `out`. Volume
/// errors are printed and the loop goes on; only `exit` or the end of the
/// input stops it.
pub struct Shell<'a, IO: BlockIO + ?Sized, R: BufRead, W: Write> {
    fs: FlatFs<'a, IO>,
    input: R,
    out: W,
    prompt: bool,
}

impl<'a, IO: BlockIO + ?Sized, R: BufRead, W: Write> Shell<'a, IO, R, W> {
    pub fn new(fs: FlatFs<'a, IO>, input: R, out: W) -> Self {
        Self {
            fs,
            input,
            out,
            prompt: true,
        }
    }

    /// Disables the banner and the prompt (scripted input).
    pub fn quiet(mut self) -> Self {
        self.prompt = false;
        self
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        if self.prompt {
            writeln!(self.out, "Welcome to flatfs")?;
            writeln!(self.out, "To get help, please type 'help' on the prompt below.")?;
            writeln!(self.out)?;
        }

        let mut line = String::new();
        loop {
            if self.prompt {
                write!(self.out, "{PROMPT}")?;
                self.out.flush()?;
            }

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }

            match Command::parse(line.trim_end_matches(['\r', '\n'])) {
                Ok(None) => continue,
                Ok(Some(Command::Exit)) => break,
                Ok(Some(cmd)) => self.execute(cmd)?,
                Err(usage) => writeln!(self.out, "Invalid command format. {usage}")?,
            }
        }

        self.fs.flush()?;
        Ok(())
    }

    fn execute(&mut self, cmd: Command<'_>) -> anyhow::Result<()> {
        crate::log_verbose!("{cmd:?}");
        let result: FsResult<Vec<String>> = match cmd {
            Command::List(path) => self.list(&path),
            Command::Cat(path) => self
                .fs
                .get_content(&path)
                .map(|content| vec![String::from_utf8_lossy(&content).into_owned()]),
            Command::Touch(path) => self
                .fs
                .create(&path, false)
                .map(|_| vec![format!("File {path} created.")]),
            Command::Edit(path) => {
                let content = self.read_until_eof()?;
                self.fs
                    .set_content(&path, content.as_bytes())
                    .map(|_| vec!["Content updated successfully.".into()])
            }
            Command::Remove(path) => self
                .fs
                .remove_file(&path)
                .map(|_| vec![format!("File {path} removed.")]),
            Command::MakeDir(path) => self
                .fs
                .create(&path, true)
                .map(|_| vec![format!("Directory {path} created.")]),
            Command::RemoveDir(path) => self
                .fs
                .remove_directory(&path)
                .map(|_| vec![format!("Directory removed: {path}")]),
            Command::Move(old, new) => self
                .fs
                .move_entry(&old, &new)
                .map(|_| vec![format!("Moved: {old} to {new}")]),
            Command::Usage => self.usage(),
            Command::Check => {
                let opts = ReportDisplayOpts {
                    show_summary: true,
                    ..ReportDisplayOpts::default()
                };
                self.fs
                    .check()
                    .map(|report| vec![report.display_with(opts).to_string().trim_end().into()])
                    .map_err(FsError::from)
            }
            Command::Format => self
                .fs
                .format()
                .map(|_| vec!["Formatted the file system.".into()]),
            Command::Help => Ok(vec![HELP.trim_end().into()]),
            Command::Exit => Ok(Vec::new()),
            Command::Unknown(name) => Ok(vec![format!("unknown command: {name}")]),
        };

        match result {
            Ok(lines) => {
                for line in &lines {
                    self.say(line)?;
                }
            }
            Err(e) => self.say(&format!("Error: {e}"))?,
        }
        Ok(())
    }

    fn list(&mut self, path: &str) -> FsResult<Vec<String>> {
        let lines = self
            .fs
            .list(path)?
            .into_iter()
            .map(|e| {
                if e.is_directory {
                    format!("{}/", e.name)
                } else {
                    format!("{:<32} {:>8}", e.name, e.size)
                }
            })
            .collect();
        Ok(lines)
    }

    fn usage(&mut self) -> FsResult<Vec<String>> {
        let u = self.fs.usage()?;
        Ok(vec![
            format!(
                "blocks:  {} used, {} free, {} total ({} bytes each)",
                u.used_blocks, u.free_blocks, u.total_blocks, u.block_size
            ),
            format!(
                "entries: {} used, {} free, {} total",
                u.used_entries,
                u.capacity - u.used_entries,
                u.capacity
            ),
        ])
    }

    /// Collects lines up to a line reading `EOF` (or the end of the input).
    /// Each line keeps its terminating `\n`.
    fn read_until_eof(&mut self) -> anyhow::Result<String> {
        writeln!(self.out, "Enter new content (type {EOF_MARKER} to finish):")?;
        let mut content = String::new();
        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let text = line.trim_end_matches(['\r', '\n']);
            if text == EOF_MARKER {
                break;
            }
            content.push_str(text);
            content.push('\n');
        }
        Ok(content)
    }

    /// Writes one response line.
    fn say(&mut self, line: &str) -> std::io::Result<()> {
        writeln!(self.out, "{line}")
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }
}
