use crate::dbopt::DbOpt;
use crate::models::{Comment, DateTime, Post};
use anyhow::{ensure, Result};
use chrono::Utc;
use clap::Parser;
use std::fmt::{self, Display};
use std::io::{stdin, stdout, Write};

#[derive(Parser)]
pub struct Args {
    #[clap(flatten)]
    db: DbOpt,

    /// Only list the comment status and queue.
    ///
    /// Does not wait for input, does not modify anything.
    #[clap(long, short)]
    list: bool,

    /// Go through the hidden comments instead of the visible ones.
    #[clap(long)]
    hidden: bool,
}

impl Args {
    pub async fn run(self) -> Result<()> {
        let mut db = self.db.get_db().await?;
        let (active, hidden) = Comment::counts(&mut db).await?;
        println!("There are {active} visible and {hidden} hidden comments.");

        let (keep, flip) = if self.hidden {
            ("hidden", "show")
        } else {
            ("keep", "hide")
        };
        for comment in Comment::with_active(!self.hidden, &mut db).await? {
            let post = Post::get(comment.post_id, &mut db).await?;
            println!(
                "{} by {:?} <{}>\nOn {:?} ({})",
                Ago(comment.created),
                comment.name,
                comment.email,
                post.title,
                post.url(),
            );
            showlimited(&comment.body);

            if !self.list {
                match prompt("How about this comment?", &[keep, flip, "quit"])?
                {
                    0 => (),
                    1 => {
                        println!("Should {flip} this");
                        Comment::set_active(comment.id, self.hidden, &mut db)
                            .await?;
                    }
                    _ => {
                        println!("Giving up for now");
                        return Ok(());
                    }
                }
            }
        }

        Ok(())
    }
}

struct Ago(DateTime);

impl Display for Ago {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        let date = self.0;
        let elapsed_mins = (Utc::now() - date).num_minutes();
        if elapsed_mins == 0 {
            out.write_str("Now")
        } else if elapsed_mins < 45 {
            write!(out, "{elapsed_mins} min ago")
        } else if elapsed_mins < 60 * 18 {
            date.format("%H:%M").fmt(out)
        } else {
            date.format("%Y-%m-%d %H:%M").fmt(out)
        }
    }
}

fn showlimited(content: &str) {
    for (i, line) in content.trim().lines().enumerate() {
        print!(" > ");
        let mut chars = line.chars();
        for c in (&mut chars).take(72) {
            print!("{c}");
        }
        if chars.next().is_some() {
            print!(" …");
        }
        println!();

        if i > 4 {
            return;
        }
    }
}

fn prompt(prompt: &str, alternatives: &[&str]) -> Result<usize> {
    let input = stdin();
    let mut buf = String::new();
    loop {
        print!("{prompt} {alternatives:?} ");
        stdout().flush()?;
        buf.clear();
        ensure!(input.read_line(&mut buf)? > 0, "Expected some input");
        if let Some(i) = choice(buf.trim(), alternatives) {
            return Ok(i);
        }
    }
}

/// The first alternative that starts with a non-empty answer.
fn choice(answer: &str, alternatives: &[&str]) -> Option<usize> {
    if answer.is_empty() {
        return None;
    }
    alternatives.iter().position(|alt| alt.starts_with(answer))
}
