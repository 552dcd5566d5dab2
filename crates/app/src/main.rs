mod adapter;
mod args;
mod notify;
mod op;
mod ops;
mod process;
mod prompt;
mod version;

use std::sync::Arc;

use args::Args;
use clap::{Parser, Subcommand};
use op::{Op, OpContext};
use ops::{
    Approve, Draft, Init, Key, Note, Post, Review, Revise, Secret, Status, Thread, Verify,
    Version,
};
use prompt::TerminalPrompt;

command_enum! {
    (Init, Init),
    (Key, Key),
    (Draft, Draft),
    (Review, Review),
    (Revise, Revise),
    (Approve, Approve),
    (Verify, Verify),
    (Post, Post),
    (Status, Status),
    (Thread, Thread),
    (Note, Note),
    (Secret, Secret),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let root = match args.workspace {
        Some(root) => root,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("Error: Failed to resolve the current directory: {}", e);
                std::process::exit(1);
            }
        },
    };

    let guards = process::init_logging(&root, args.verbose);
    let ctx = OpContext::new(root, Arc::new(TerminalPrompt));

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush buffered log lines before exiting
    drop(guards);
    std::process::exit(code);
}
