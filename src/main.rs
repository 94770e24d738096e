use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use vmm::{
    compare_algorithms, fault_curve, reference_trace, MemoryConfig, PageNumber, Policy,
    PolicyReport, VirtualMemoryManager, DEFAULT_PAGE_SIZE,
};

/// Demand-paging simulator: watch FIFO, LRU and Clock replacement at work.
#[derive(Parser, Debug)]
#[command(name = "pagesim", version, about)]
struct Cli {
    /// Emit JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk through allocation, faults, replacement and freeing for two processes.
    Demo {
        #[arg(long, default_value_t = 4)]
        frames: usize,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u64,
        #[arg(long, default_value = "lru")]
        policy: Policy,
    },
    /// Replay a page reference string under each policy.
    Compare {
        /// Comma-separated page numbers, e.g. 1,2,3,4,1,2,5.
        #[arg(long, default_value = "0,1,2,3,0,1,4,5,0,1,2,3,4,5")]
        pages: String,
        #[arg(long, default_value_t = 4)]
        frames: usize,
        /// Restrict to these policies; all by default.
        #[arg(long, value_delimiter = ',')]
        policy: Vec<Policy>,
    },
    /// Fault counts of one policy across a range of frame counts.
    Curve {
        #[arg(long, default_value = "1,2,3,4,1,2,5,1,2,3,4,5")]
        pages: String,
        #[arg(long, default_value = "fifo")]
        policy: Policy,
        #[arg(long, default_value_t = 1)]
        min_frames: usize,
        #[arg(long, default_value_t = 6)]
        max_frames: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    debug!("{cli:?}");

    match cli.command {
        Command::Demo {
            frames,
            page_size,
            policy,
        } => demo(MemoryConfig::with_frames(frames, page_size, policy), cli.json),
        Command::Compare {
            pages,
            frames,
            policy,
        } => {
            let trace = reference_trace(1, &parse_pages(&pages)?)?;
            let policies = if policy.is_empty() {
                Policy::ALL.to_vec()
            } else {
                policy
            };
            let reports = compare_algorithms(&trace, frames, &policies)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                print!("{}", render_comparison(&reports));
            }
            Ok(())
        }
        Command::Curve {
            pages,
            policy,
            min_frames,
            max_frames,
        } => {
            let trace = reference_trace(1, &parse_pages(&pages)?)?;
            let curve = fault_curve(&trace, policy, min_frames..=max_frames)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&curve)?);
            } else {
                print!("{}", render_curve(policy, &curve));
            }
            Ok(())
        }
    }
}

fn parse_pages(pages: &str) -> Result<Vec<PageNumber>> {
    pages
        .split(',')
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .map(|page| {
            page.parse::<PageNumber>()
                .with_context(|| format!("invalid page number '{page}'"))
        })
        .collect()
}

fn demo(config: MemoryConfig, json: bool) -> Result<()> {
    let page_size = config.page_size;
    let mut vmm = VirtualMemoryManager::new(config)?;

    let step = |title: &str, vmm: &VirtualMemoryManager| -> Result<()> {
        if json {
            let snapshot = serde_json::json!({
                "step": title,
                "stats": vmm.get_memory_stats(),
                "memory_map": vmm.memory_map(),
            });
            println!("{}", serde_json::to_string(&snapshot)?);
        } else {
            println!("\n{title}");
            print_memory_map(vmm);
        }
        Ok(())
    };

    vmm.allocate_pages(1, 3)?;
    step("1. process 1 allocates 3 pages", &vmm)?;

    vmm.allocate_pages(2, 2)?;
    step("2. process 2 allocates 2 pages", &vmm)?;

    let address = |page: u64| {
        page.checked_mul(page_size).with_context(|| {
            format!("page {page} of {page_size} bytes lies beyond the address space")
        })
    };

    for page in 0..3 {
        vmm.access_memory(1, address(page)?, page == 0)?;
    }
    step("3. process 1 touches its pages (writes page 0)", &vmm)?;

    for page in 0..2 {
        vmm.access_memory(2, address(page)?, false)?;
    }
    vmm.access_memory(1, address(1)?, false)?;
    step("4. process 2 touches its pages, forcing replacement", &vmm)?;

    vmm.free_pages(1);
    step("5. process 1 frees all its pages", &vmm)?;

    vmm.check_invariants()?;
    Ok(())
}

fn print_memory_map(vmm: &VirtualMemoryManager) {
    println!("memory map ({} replacement):", vmm.policy());
    println!("{:<6} {:<8} {:<8} {:<5} {:<5}", "frame", "process", "page", "ref", "dirty");
    for frame in vmm.memory_map() {
        match frame.occupant {
            Some(key) => println!(
                "{:<6} {:<8} {:<8} {:<5} {:<5}",
                frame.frame,
                key.process_id,
                key.page_number,
                u8::from(frame.reference_bit),
                u8::from(frame.dirty_bit)
            ),
            None => println!("{:<6} {:<8} {:<8} {:<5} {:<5}", frame.frame, "free", "-", "-", "-"),
        }
    }

    let stats = vmm.get_memory_stats();
    println!(
        "frames used {}/{}, accesses {}, faults {}, hits {}, fault rate {:.2}%, write-backs {}",
        stats.frames_used,
        stats.frames_total,
        stats.total_accesses,
        stats.page_faults,
        stats.hits,
        stats.fault_rate * 100.0,
        stats.write_backs
    );
}

fn render_comparison(reports: &[PolicyReport]) -> String {
    let mut out = format!(
        "{:<8} {:>7} {:>8} {:>6} {:>10}\n",
        "policy", "frames", "faults", "hits", "fault rate"
    );
    for report in reports {
        out.push_str(&format!(
            "{:<8} {:>7} {:>8} {:>6} {:>9.2}%\n",
            report.policy.to_string(),
            report.frame_count,
            report.page_faults,
            report.hits,
            report.fault_rate * 100.0
        ));
    }
    out
}

/// One line per frame count; a count that faults more than the one before
/// it is marked as Belady's anomaly.
fn render_curve(policy: Policy, curve: &[(usize, u64)]) -> String {
    let mut out = format!("{policy} faults by frame count:\n");
    let mut previous = None;
    for &(frames, faults) in curve {
        let marker = match previous {
            Some(last) if faults > last => "  <- Belady's anomaly",
            _ => "",
        };
        out.push_str(&format!("  {frames:>3} frames: {faults:>4}{marker}\n"));
        previous = Some(faults);
    }
    out
}
