use std::path::PathBuf;

use setup_analysis::coverage::{all_bags, CoverageAnalyzer, CoverageRules};
use setup_analysis::data::{bag_string, parse_piece, parse_seq, Bag, Piece, EMPTY, GARBAGE};
use setup_analysis::field::Grid;
use setup_analysis::{fumen, locate, logging, store, Error};
use structopt::StructOpt;

#[derive(StructOpt)]
pub struct Opt {
    /// More output per occurrence: info, debug, trace
    #[structopt(short, long, parse(from_occurrences), global = true)]
    verbose: u8,
    /// Also write a debug log to this file
    #[structopt(long, parse(from_os_str), global = true)]
    log_file: Option<PathBuf>,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// Print the board and comment of a diagram
    Decode { fumen: String },
    /// Print the left-right mirror of a diagram
    EncodeMirror { fumen: String },
    /// Find where each piece of a diagram was placed
    Placements { fumen: String },
    /// Count the bags that can build a diagram
    Coverage(CoverageOptions),
    /// Rank the continuations of the best stored setup by the bags they add
    Systematize(SystematizeOptions),
    /// Print a stored setup archive
    Setups {
        #[structopt(parse(from_os_str))]
        archive: PathBuf,
    },
}

#[derive(StructOpt)]
pub struct CoverageOptions {
    fumen: String,
    /// Pieces of the bag, in any order
    #[structopt(long, default_value = "IOTLJSZ")]
    pieces: String,
    #[structopt(long)]
    hold: bool,
    #[structopt(long)]
    mirror: bool,
    /// Only count bags ending in this piece
    #[structopt(long, parse(try_from_str = piece_arg))]
    last_piece: Option<Piece>,
    /// Print every covered bag
    #[structopt(long)]
    list: bool,
}

#[derive(StructOpt)]
pub struct SystematizeOptions {
    #[structopt(parse(from_os_str))]
    archive: PathBuf,
    #[structopt(long, default_value = "IOTLJSZ")]
    pieces: String,
    #[structopt(long)]
    mirror: bool,
    #[structopt(long, parse(try_from_str = piece_arg), default_value = "T")]
    last_piece: Piece,
}

pub fn main() {
    let opt = Opt::from_args();
    let level = logging::level(opt.verbose);
    if let Err(e) = logging::init_log(level, opt.log_file.as_deref()) {
        eprintln!("{}", e);
        std::process::exit(2);
    }
    if let Err(e) = opt.command.run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

impl Command {
    fn run(self) -> Result<(), Error> {
        match self {
            Command::Decode { fumen } => {
                let (grid, comment) = fumen::decode(&fumen)?;
                println!("{}", colored_diagram(&grid));
                if !comment.is_empty() {
                    println!("{}", comment);
                }
            }
            Command::EncodeMirror { fumen } => {
                let (grid, comment) = fumen::decode(&fumen)?;
                println!("{}", fumen::encode([(&grid.mirrored(), comment.as_str())])?);
            }
            Command::Placements { fumen } => {
                let (grid, _) = fumen::decode(&fumen)?;
                for placement in locate::find_placements(&grid)?.iter() {
                    println!("{}", placement);
                }
            }
            Command::Coverage(options) => options.run()?,
            Command::Systematize(options) => options.run()?,
            Command::Setups { archive } => {
                for setup in store::load_setups(&archive)? {
                    println!("{}", setup);
                    println!("{}", setup.to_fumen()?);
                    println!();
                }
            }
        }
        Ok(())
    }
}

impl CoverageOptions {
    fn run(self) -> Result<(), Error> {
        let (grid, _) = fumen::decode(&self.fumen)?;
        let bags = all_bags(&pieces(&self.pieces)?);
        let rules = CoverageRules {
            hold: self.hold,
            mirror: self.mirror,
            force_last: self.last_piece,
        };
        let covered = CoverageAnalyzer::default().bag_coverage(&grid, &bags, rules)?;
        if self.list {
            let mut list: Vec<String> = covered.iter().map(|b| bag_string(b)).collect();
            list.sort();
            for bag in list {
                println!("{}", bag);
            }
        }
        println!(
            "{}/{} = {:.2}%",
            covered.len(),
            bags.len(),
            percent(covered.len(), bags.len())
        );
        Ok(())
    }
}

impl SystematizeOptions {
    fn run(self) -> Result<(), Error> {
        let mut setups = store::load_setups(&self.archive)?;
        setups.sort_by(|a, b| b.success_rate.total_cmp(&a.success_rate));
        let best = setups
            .first()
            .ok_or_else(|| Error::Usage(format!("no setups in {}", self.archive.display())))?;
        println!("{}", best.solution.fumen);

        let candidates = best.candidates()?;
        let bags = all_bags(&pieces(&self.pieces)?);
        let rules = CoverageRules {
            hold: true,
            mirror: self.mirror,
            force_last: Some(self.last_piece),
        };
        let system = CoverageAnalyzer::default().systematize(&candidates, &bags, rules)?;
        for step in &system.steps {
            println!(
                "{} +{} bags @ {:.2}% -> {}/{} = {:.2}%",
                best.continuations[step.index].solution.fumen,
                step.new_bags,
                candidates[step.index].success_rate,
                step.covered,
                system.total_bags,
                step.success_rate
            );
        }
        println!(
            "covered {}/{} = {:.2}%, success {:.2}%",
            system.covered.len(),
            system.total_bags,
            percent(system.covered.len(), system.total_bags),
            system.success_rate
        );
        Ok(())
    }
}

fn pieces(list: &str) -> Result<Bag, Error> {
    parse_seq(list).map_err(|e| Error::Pieces(format!("{:?}: {}", list, e)))
}

fn piece_arg(arg: &str) -> Result<Piece, &'static str> {
    let mut chars = arg.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => parse_piece(c),
        _ => Err("expected a single piece"),
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    match whole {
        0 => 0.0,
        n => part as f64 * 100.0 / n as f64,
    }
}

/// Top row first, pieces by letter, garbage as `X`.
fn colored_diagram(grid: &Grid) -> String {
    grid.rows()
        .iter()
        .rev()
        .map(|row| {
            row.iter()
                .map(|&c| match c {
                    EMPTY => '_',
                    GARBAGE => 'X',
                    c => Piece::from_color(c).map_or('?', Piece::to_char),
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
