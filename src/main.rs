mod cli;
mod logger;

use std::process;
use std::thread;
use std::time::Duration;

use clap::Parser;
use grammarian::{GrammarError, SharedGrammar};
use log::info;

use cli::Cli;

fn report(error: &GrammarError) {
    eprintln!("\x1b[31;49;1m[error]\x1b[39;49;1m  {}\x1b[0m", error);
}

fn exit_code(error: &GrammarError) -> i32 {
    if error.error.is_file_error() {
        exitcode::IOERR
    } else {
        exitcode::DATAERR
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init(cli.log_level()) {
        eprintln!("failed to set up logging: {e}");
    }

    let shared = match SharedGrammar::open(&cli.file) {
        Ok(shared) => shared,
        Err(e) => {
            report(&e);
            process::exit(exit_code(&e));
        }
    };

    let grammar = shared.current();
    if cli.print {
        print!("{}", grammar);
    }
    println!(
        "{}: ok, root {}, {} nonterminals, {} terminals, {} productions",
        cli.file.display(),
        grammar.nonterminal(grammar.root()).name(),
        grammar.symbols().nonterminal_count(),
        grammar.symbols().terminal_count(),
        grammar.production_count()
    );

    let Some(seconds) = cli.watch else {
        process::exit(exitcode::OK);
    };

    info!("watching {} every {}s", shared.path().display(), seconds);
    loop {
        thread::sleep(Duration::from_secs(seconds.max(1)));

        match shared.refresh() {
            Ok(true) => {
                let grammar = shared.current();
                if cli.print {
                    print!("{}", grammar);
                }
                println!("{}: reloaded", cli.file.display());
            }
            Ok(false) => {}
            // Already logged, and the previous grammar stays in service
            Err(_) => {}
        }
    }
}
