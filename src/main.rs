use clap::{Parser, Subcommand};
use roguesav::save::{backup_file, SaveFile};
use roguesav::store::scanner::{ChecksumStatus, SectorHealth};
use roguesav::transcoder::{GameStateSnapshot, Mutation};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "roguesav", about = "Emerald Rogue save inspector and 1.3.2 → 2.0 converter")]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print trainer, money, bag, dex and records of a save
    Inspect {
        save: PathBuf,
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// List every sector frame with its verdict and checksum status
    Scan {
        save: PathBuf,
    },
    /// Merge money, bag, records and dex of another save into this one
    Merge {
        save: PathBuf,
        #[arg(short, long)]
        from: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Debug preset: money, a stack of balls, a cloned party lead, full dex
    Tamper {
        save: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        money: Option<u32>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "roguesav=debug" } else { "roguesav=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {

        // ── Inspect ──────────────────────────────────────────────────────────
        Commands::Inspect { save, json } => {
            let sav = SaveFile::read(&save)?;
            if json {
                println!("{}", serde_json::to_string_pretty(sav.snapshot())?);
            } else {
                print_snapshot(&save, sav.snapshot());
            }
        }

        // ── Scan ─────────────────────────────────────────────────────────────
        Commands::Scan { save } => {
            let sav = SaveFile::read(&save)?;
            let report = sav.report();
            println!("{:>3} {:>8} {:>6} {:>10}  {:<30} Checksum", "#", "Offset", "Id", "Counter", "Verdict");
            for s in &report.sectors {
                let verdict = match &s.health {
                    SectorHealth::Accepted { region, position } => format!("{}[{}]", region.name(), position),
                    SectorHealth::Stale { region, counter, region_counter } =>
                        format!("stale {} ({} < {})", region.name(), counter, region_counter),
                    SectorHealth::Empty              => "empty".into(),
                    SectorHealth::UnknownId { id }   => format!("unknown id {}", id),
                };
                let checksum = match s.checksum {
                    ChecksumStatus::Valid => "ok".to_string(),
                    ChecksumStatus::Mismatch { stored, computed } =>
                        format!("stored {:04x}, computed {:04x}", stored, computed),
                };
                println!("{:>3} {:>8x} {:>6} {:>10}  {:<30} {}",
                    s.index, s.offset, s.footer.id, s.footer.counter, verdict, checksum);
            }
            println!("{} (format {})", report.summary(), sav.version());
            for s in report.mismatches().filter(|s| s.health.is_accepted()) {
                println!("  sector {} was used despite a checksum mismatch", s.index);
            }
        }

        // ── Merge ────────────────────────────────────────────────────────────
        Commands::Merge { save, from, output } => {
            backup_file(&save)?;
            let source = SaveFile::read(&from)?;
            let mut target = SaveFile::read(&save)?;
            let mutation = Mutation::merge_from(source.snapshot(), target.version());
            target.apply(&mutation)?;
            target.write(&output)?;
            print_snapshot(&output, target.snapshot());
            println!("Merged {} ({}) → {}", from.display(), source.version(), output.display());
        }

        // ── Tamper ───────────────────────────────────────────────────────────
        Commands::Tamper { save, output, money } => {
            backup_file(&save)?;
            let mut sav = SaveFile::read(&save)?;
            let mut mutation = Mutation::tamper();
            if money.is_some() {
                mutation.money = money;
            }
            sav.apply(&mutation)?;
            sav.write(&output)?;
            print_snapshot(&output, sav.snapshot());
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn print_snapshot(path: &Path, snap: &GameStateSnapshot) {
    println!("── Save ─────────────────────────────────────────────────");
    println!("  Path           {}", path.display());
    println!("  Format         {}", snap.version);
    println!("  Trainer        {} (gender {})", snap.trainer.name, snap.trainer.gender);
    println!("  Trainer id     0x{:08X}", snap.trainer.id);
    println!("  Played         {:02}:{:02}", snap.stats.hours, snap.stats.minutes);
    println!("  Money          {}", snap.stats.money);
    println!("  Key            {}", hex::encode(snap.key.to_le_bytes()));
    println!("  Pokedex        {} seen, {} caught", snap.pokedex.seen, snap.pokedex.caught);
    println!("  Items ({}):", snap.items.len());
    for it in &snap.items {
        println!("    id={:<5} x{}", it.id, it.quantity);
    }
    println!("  Records ({}):", snap.party.len() + snap.boxes.len());
    for (i, mon) in snap.party.iter().enumerate() {
        println!("    party  {:>2}     {:<10} species={:<4} lv.met={:<3} shiny={}",
            i + 1, mon.nickname, mon.species(), mon.met_level(), mon.shiny);
    }
    for b in &snap.boxes {
        println!("    box {:>2} slot {:>2} {:<10} species={:<4} lv.met={:<3} shiny={}",
            b.box_number, b.slot, b.record.nickname, b.record.species(), b.record.met_level(), b.record.shiny);
    }
}
