use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use trine_engine::{
    Capacity, Engine, EngineConfig, EngineStats, Snapshot, SnapshotStats, TermId, TriplePattern,
};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Demo => cmd_demo(config, cli.format),
        Command::Bench(args) => cmd_bench(config, args, cli.format),
        Command::Query(args) => cmd_query(config, args, cli.format),
        Command::Snapshot(args) => cmd_snapshot(config, args, cli.format),
        Command::Inspect(args) => cmd_inspect(args, cli.format),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = EngineConfig::from_toml_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn yes_no(answer: bool) -> colored::ColoredString {
    if answer {
        "true".green().bold()
    } else {
        "false".red().bold()
    }
}

/// Load whitespace-separated `subject predicate object` lines into `engine`.
///
/// Blank lines and lines starting with `#` are skipped; a trailing `.` token
/// is accepted. Returns the number of new triples.
pub(crate) fn load_triples(engine: &mut Engine, path: &Path) -> anyhow::Result<usize> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading triples from {}", path.display()))?;
    let mut added = 0;
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() == 4 && tokens[3] == "." {
            tokens.pop();
        }
        let &[s, p, o] = tokens.as_slice() else {
            bail!(
                "{}:{}: expected `subject predicate object`, found {} terms",
                path.display(),
                n + 1,
                tokens.len()
            );
        };
        if engine
            .insert(s, p, o)
            .with_context(|| format!("{}:{}", path.display(), n + 1))?
        {
            added += 1;
        }
    }
    info!(path = %path.display(), added, "loaded triples");
    Ok(added)
}

/// `?` and `_` are wildcards. A text that is not a term but reads `#n` names
/// id `n` directly; any other unknown text yields `None`.
fn pattern_term(engine: &Engine, text: &str) -> Option<TermId> {
    match text {
        "?" | "_" => Some(TermId::WILDCARD),
        _ => engine
            .lookup(text)
            .or_else(|| text.starts_with('#').then(|| text.parse().ok()).flatten()),
    }
}

fn display_term(engine: &Engine, id: TermId) -> String {
    engine
        .resolve(id)
        .map(str::to_owned)
        .unwrap_or_else(|_| id.to_string())
}

// ---- demo ----

fn cmd_demo(config: EngineConfig, format: OutputFormat) -> anyhow::Result<()> {
    let mut engine = Engine::new(config)?;
    let alice = engine.intern("alice")?;
    let knows = engine.intern("knows")?;
    let charlie = engine.intern("charlie")?;
    let bob = engine.intern("bob")?;
    engine.add_triple(alice, knows, charlie)?;

    let answers = [
        ("alice knows charlie", engine.ask(alice, knows, charlie)),
        ("alice knows ?", engine.ask(alice, knows, TermId::WILDCARD)),
        ("alice knows bob", engine.ask(alice, knows, bob)),
    ];

    match format {
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = answers
                .iter()
                .map(|(q, a)| (q.to_string(), json!(a)))
                .collect();
            print_json(&map)
        }
        OutputFormat::Text => {
            println!("{} added (alice, knows, charlie)", "✓".green().bold());
            for (question, answer) in answers {
                println!("  ask {:<22} {}", question, yes_no(answer));
            }
            Ok(())
        }
    }
}

// ---- bench ----

#[derive(Serialize)]
struct BenchReport {
    triples: usize,
    ingest_secs: f64,
    ingest_per_sec: f64,
    ask_ns: f64,
    ask_batch_ns: f64,
    transitive_us: f64,
    snapshot_build_ms: f64,
    live_bytes: usize,
    snapshot_bytes: usize,
    encoded_bytes: usize,
    engine: EngineStats,
    snapshot: SnapshotStats,
}

fn cmd_bench(mut config: EngineConfig, args: BenchArgs, format: OutputFormat) -> anyhow::Result<()> {
    if args.subjects < 2 || args.predicates < 1 || args.fanout == 0 {
        bail!("bench needs --subjects >= 2, --predicates >= 1 and --fanout >= 1");
    }
    let (Some(subject_bound), Some(predicate_bound)) =
        (args.subjects.checked_add(1), args.predicates.checked_add(1))
    else {
        bail!("--subjects and --predicates must be below {}", u32::MAX);
    };
    config.capacity = Capacity {
        max_subjects: subject_bound,
        max_predicates: predicate_bound,
        max_objects: subject_bound,
    };
    let mut engine = Engine::new(config)?;
    let mut rng = StdRng::seed_from_u64(args.seed);

    // Objects are drawn from the subject id space so chains exist for the reasoner.
    let start = Instant::now();
    let mut attempts = 0usize;
    while attempts < args.triples {
        let s = TermId::new(rng.gen_range(1..=args.subjects));
        let p = TermId::new(rng.gen_range(1..=args.predicates));
        for _ in 0..args.fanout.min(args.triples - attempts) {
            let o = TermId::new(rng.gen_range(1..=args.subjects));
            engine.add_triple(s, p, o)?;
            attempts += 1;
        }
    }
    let ingest = start.elapsed().as_secs_f64();

    let patterns: Vec<TriplePattern> = (0..args.queries)
        .map(|_| {
            TriplePattern::new(
                TermId::new(rng.gen_range(1..=args.subjects)),
                TermId::new(rng.gen_range(1..=args.predicates)),
                TermId::new(rng.gen_range(0..=args.subjects)),
            )
        })
        .collect();

    let start = Instant::now();
    let mut hits = 0usize;
    for q in &patterns {
        hits += usize::from(engine.ask(q.subject, q.predicate, q.object));
    }
    let ask = start.elapsed().as_secs_f64();

    let start = Instant::now();
    let batch = engine.ask_batch(&patterns);
    let ask_batch = start.elapsed().as_secs_f64();
    anyhow::ensure!(
        batch.iter().filter(|&&b| b).count() == hits,
        "batch and single lookups disagree"
    );

    let sampled = patterns.len().min(10_000);
    let start = Instant::now();
    for q in &patterns[..sampled] {
        std::hint::black_box(engine.is_related(q.subject, q.predicate, q.object));
    }
    let transitive = start.elapsed().as_secs_f64();

    let start = Instant::now();
    let snapshot = engine.snapshot()?;
    let snapshot_build = start.elapsed().as_secs_f64();
    let encoded = snapshot.to_bytes(engine.config().snapshot.zstd_level)?;

    let per = |secs: f64, n: usize| if n == 0 { 0.0 } else { secs / n as f64 };
    let stats = engine.stats();
    let report = BenchReport {
        triples: engine.len(),
        ingest_secs: ingest,
        ingest_per_sec: attempts as f64 / ingest.max(f64::EPSILON),
        ask_ns: per(ask, patterns.len()) * 1e9,
        ask_batch_ns: per(ask_batch, patterns.len()) * 1e9,
        transitive_us: per(transitive, sampled) * 1e6,
        snapshot_build_ms: snapshot_build * 1e3,
        live_bytes: stats.heap_bytes,
        snapshot_bytes: snapshot.heap_bytes(),
        encoded_bytes: encoded.len(),
        engine: stats,
        snapshot: snapshot.stats(),
    };

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            println!("{}", "Ingestion".bold());
            println!("  {} triples ({} attempts) in {:.3}s, {:.0} triples/s",
                report.triples, attempts, report.ingest_secs, report.ingest_per_sec);
            println!("{}", "Queries".bold());
            println!("  ask            {:>10.1} ns/op  ({} hits of {})", report.ask_ns, hits, patterns.len());
            println!("  ask_batch      {:>10.1} ns/op", report.ask_batch_ns);
            println!("  transitive     {:>10.2} µs/op  (depth {})", report.transitive_us, engine.config().max_depth);
            println!("{}", "Snapshot".bold());
            println!("  build          {:>10.2} ms", report.snapshot_build_ms);
            println!("  layouts        {} csr, {} dictionary",
                report.snapshot.csr_predicates, report.snapshot.dictionary_predicates);
            println!("{}", "Memory".bold());
            println!("  live           {:>12} bytes", report.live_bytes);
            println!("  snapshot       {:>12} bytes", report.snapshot_bytes.to_string().cyan());
            println!("  encoded        {:>12} bytes", report.encoded_bytes.to_string().cyan());
            Ok(())
        }
    }
}

// ---- query ----

fn cmd_query(config: EngineConfig, args: QueryArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut engine = Engine::new(config)?;
    load_triples(&mut engine, &args.file)?;

    let terms = [
        pattern_term(&engine, &args.subject),
        pattern_term(&engine, &args.predicate),
        pattern_term(&engine, &args.object),
    ];
    let pattern = match terms {
        [Some(s), Some(p), Some(o)] => Some(TriplePattern::new(s, p, o)),
        _ => None,
    };

    if let (Some(q), true) = (pattern, args.transitive) {
        if q.predicate.is_wildcard() {
            bail!("--transitive needs a concrete predicate");
        }
        engine.declare_transitive(q.predicate);
    }

    let answer = pattern.is_some_and(|q| {
        if args.transitive {
            engine.ask_entailed(q.subject, q.predicate, q.object)
        } else {
            engine.ask_pattern(&q)
        }
    });
    let matches: Vec<[String; 3]> = match (pattern, args.list) {
        (Some(q), true) => engine
            .matches(&q)
            .into_iter()
            .map(|t| {
                [
                    display_term(&engine, t.subject),
                    display_term(&engine, t.predicate),
                    display_term(&engine, t.object),
                ]
            })
            .collect(),
        _ => Vec::new(),
    };

    match format {
        OutputFormat::Json => print_json(&json!({
            "pattern": [args.subject, args.predicate, args.object],
            "answer": answer,
            "matches": matches,
        })),
        OutputFormat::Text => {
            println!("({}, {}, {}) {}", args.subject, args.predicate, args.object, yes_no(answer));
            for [s, p, o] in &matches {
                println!("  {} {} {}", s, p.cyan(), o);
            }
            Ok(())
        }
    }
}

// ---- snapshot / inspect ----

fn cmd_snapshot(config: EngineConfig, args: SnapshotArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut engine = Engine::new(config)?;
    load_triples(&mut engine, &args.file)?;
    let snapshot = engine
        .save_snapshot(&args.out)
        .with_context(|| format!("writing snapshot {}", args.out.display()))?;
    let written = std::fs::metadata(&args.out)?.len();
    let stats = snapshot.stats();

    match format {
        OutputFormat::Json => print_json(&json!({
            "path": args.out,
            "bytes": written,
            "live_bytes": engine.stats().heap_bytes,
            "snapshot": stats,
        })),
        OutputFormat::Text => {
            println!("{} Wrote {} ({} bytes)", "✓".green().bold(), args.out.display().to_string().bold(), written);
            println!("  {} triples, {} predicates, {} terms", stats.triples, stats.predicates, stats.terms);
            println!("  live {} bytes → compressed {} bytes", engine.stats().heap_bytes, stats.heap_bytes);
            Ok(())
        }
    }
}

fn cmd_inspect(args: InspectArgs, format: OutputFormat) -> anyhow::Result<()> {
    let snapshot = Snapshot::load(&args.path)
        .with_context(|| format!("loading snapshot {}", args.path.display()))?;
    let name = |id: TermId| snapshot.resolve(id).unwrap_or_else(|_| id.to_string());

    #[derive(Serialize)]
    struct PredicateSummary {
        predicate: String,
        layout: &'static str,
        triples: usize,
        subjects: usize,
        objects: usize,
        heap_bytes: usize,
    }
    let predicates: Vec<PredicateSummary> = snapshot
        .predicates()
        .iter()
        .map(|cp| PredicateSummary {
            predicate: name(cp.predicate),
            layout: cp.layout.name(),
            triples: cp.triples,
            subjects: cp.subjects.popcount(),
            objects: cp.objects.popcount(),
            heap_bytes: cp.heap_bytes(),
        })
        .collect();
    let triples: Vec<[String; 3]> = if args.triples {
        snapshot
            .iter_triples()
            .map(|t| [name(t.subject), name(t.predicate), name(t.object)])
            .collect()
    } else {
        Vec::new()
    };

    match format {
        OutputFormat::Json => print_json(&json!({
            "stats": snapshot.stats(),
            "capacity": snapshot.capacity(),
            "predicates": predicates,
            "triples": triples,
        })),
        OutputFormat::Text => {
            let stats = snapshot.stats();
            println!("Snapshot {}", args.path.display().to_string().bold());
            println!("  {} triples, {} predicates, {} terms, {} bytes in memory",
                stats.triples, stats.predicates, stats.terms, stats.heap_bytes);
            for p in &predicates {
                println!("  {:<32} {:<10} {:>8} triples {:>8} subjects {:>8} objects",
                    p.predicate.cyan(), p.layout.yellow(), p.triples, p.subjects, p.objects);
            }
            for [s, p, o] in &triples {
                println!("    {} {} {}", s, p.cyan(), o);
            }
            Ok(())
        }
    }
}
