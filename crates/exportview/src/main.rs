#![deny(unused_must_use)]

use std::{
    fs,
    io::{self, BufWriter, Write},
};

use anyhow::{Context, bail};
use clap::Parser;
use exportview_core::{
    Insights, Session, Snapshot, Status, Upload, ViewerConfig, filter::ALL_PROFILES,
    render::{terminal_safe, write_text_table},
};
use serde_json::json;

mod cli;
mod logging;

use cli::Args;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = logging::init_logger()?;

    let config = args.apply(ViewerConfig::from_env()?);
    let upload = Upload::from_path(&args.input)
        .with_context(|| format!("Cannot open {}", args.input.display()))?;

    let mut session = Session::new(config);
    session.load(&upload);
    match session.status() {
        Some(Status::Error(msg)) => bail!("{}", terminal_safe(msg)),
        Some(Status::Success(msg)) => eprintln!("{}", terminal_safe(msg)),
        None => {},
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if args.profiles {
        writeln!(out, "{ALL_PROFILES}")?;
        for profile in session.profiles() {
            writeln!(out, "{}", terminal_safe(profile))?;
        }
        return Ok(out.flush()?);
    }

    if let Some(profile) = &args.profile {
        if !profile.is_empty() && !session.profiles().contains(profile) {
            eprintln!("No records for profile '{}'.", terminal_safe(profile));
        }
        session.select_profile(profile);
    }
    if let Some(query) = &args.search {
        session.set_query(query);
    }
    if args.page != 1 && session.go_to_page(args.page).is_empty() {
        eprintln!(
            "Page {} is out of range, showing {}.",
            args.page,
            session.pager().label()
        );
    }

    let snapshot = session.snapshot();
    let insights = args.insights.then(|| session.insights());

    if args.json {
        let value = match &insights {
            Some(insights) => json!({ "state": snapshot, "insights": insights }),
            None => json!({ "state": snapshot }),
        };
        serde_json::to_writer_pretty(&mut out, &value)?;
        writeln!(out)?;
    } else {
        print_page(&mut out, &snapshot)?;
        if let Some(insights) = &insights {
            print_insights(&mut out, insights)?;
        }
    }
    out.flush()?;

    if let Some(path) = &args.html {
        fs::write(path, session.render_html())
            .with_context(|| format!("Cannot write {}", path.display()))?;
        eprintln!("Wrote {}", path.display());
    }

    if let Some(dir) = &args.download {
        let Some(path) = session.save_download(dir)? else {
            bail!("Nothing to download.");
        };
        eprintln!(
            "{}: saved {}",
            terminal_safe(&snapshot.download_label),
            path.display()
        );
    }

    Ok(())
}

fn print_page<W: Write>(out: &mut W, snapshot: &Snapshot) -> anyhow::Result<()> {
    let profile = if snapshot.profile.is_empty() {
        ALL_PROFILES
    } else {
        &snapshot.profile
    };
    writeln!(out, "Records: {}", snapshot.summary.count)?;
    writeln!(out, "Dates:   {}", snapshot.date_range)?;
    writeln!(out, "Profile: {}", terminal_safe(profile))?;
    writeln!(out)?;
    write_text_table(&mut *out, &snapshot.grid)?;
    writeln!(out)?;
    writeln!(out, "{}", snapshot.page_label)?;
    Ok(())
}

fn print_insights<W: Write>(out: &mut W, insights: &Insights) -> anyhow::Result<()> {
    writeln!(out)?;
    writeln!(out, "Total watch time: {}", insights.total_watch_time())?;
    match &insights.most_watched {
        Some((series, n)) => {
            writeln!(out, "Most watched:     {} ({n} views)", terminal_safe(series))?
        },
        None => writeln!(out, "Most watched:     N/A")?,
    }
    writeln!(out, "Unique titles:    {}", insights.unique_titles)?;
    writeln!(out, "Unique devices:   {}", insights.unique_devices)?;
    Ok(())
}
