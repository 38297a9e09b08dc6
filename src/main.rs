use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use zwire::convert::format_score;
use zwire::{
    Aggregate, Client, ClientConfig, Command, ScoreBound, SetOp, ZAdd, ZCard, ZCount, ZIncrBy,
    ZMember, ZRange, ZRangeByScore, ZRank, ZRem, ZRemRangeByRank, ZRemRangeByScore, ZScore,
    ZStore,
};

#[derive(Parser)]
#[command(name = "zwire")]
#[command(about = "Run sorted-set commands against a Redis-compatible server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    addr: String,

    /// Reply timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    /// Print the command line instead of sending it
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Add members: SCORE MEMBER [SCORE MEMBER ...]
    Zadd {
        key: String,
        #[arg(required = true, num_args = 2.., allow_hyphen_values = true)]
        pairs: Vec<String>,
    },
    /// Remove members
    Zrem {
        key: String,
        #[arg(required = true)]
        members: Vec<String>,
    },
    /// Increment the score of a member
    Zincrby {
        key: String,
        #[arg(allow_hyphen_values = true)]
        increment: f64,
        member: String,
    },
    /// Number of members
    Zcard { key: String },
    /// Score of a member
    Zscore { key: String, member: String },
    /// Members by index
    Zrange {
        key: String,
        #[arg(default_value_t = 0, allow_hyphen_values = true)]
        start: i64,
        #[arg(default_value_t = -1, allow_hyphen_values = true)]
        stop: i64,
        #[arg(long)]
        rev: bool,
        #[arg(long)]
        withscores: bool,
    },
    /// Members by score
    Zrangebyscore {
        key: String,
        #[command(flatten)]
        bounds: Bounds,
        #[arg(long, num_args = 2, value_names = ["OFFSET", "COUNT"], allow_hyphen_values = true)]
        limit: Option<Vec<i64>>,
        #[arg(long)]
        rev: bool,
        #[arg(long)]
        withscores: bool,
    },
    /// Count members within a score range
    Zcount {
        key: String,
        #[command(flatten)]
        bounds: Bounds,
    },
    /// Rank of a member
    Zrank {
        key: String,
        member: String,
        #[arg(long)]
        rev: bool,
    },
    /// Remove members by index range
    Zremrangebyrank {
        key: String,
        #[arg(allow_hyphen_values = true)]
        start: i64,
        #[arg(allow_hyphen_values = true)]
        stop: i64,
    },
    /// Remove members by score range
    Zremrangebyscore {
        key: String,
        #[arg(allow_hyphen_values = true)]
        min: f64,
        #[arg(allow_hyphen_values = true)]
        max: f64,
    },
    /// Store the union of several sets
    Zunionstore(Store),
    /// Store the intersection of several sets
    Zinterstore(Store),
}

#[derive(clap::Args)]
struct Bounds {
    #[arg(long, default_value = "-inf", allow_hyphen_values = true)]
    min: f64,
    #[arg(long, default_value = "+inf", allow_hyphen_values = true)]
    max: f64,
    /// Exclude members scoring exactly --min
    #[arg(long)]
    min_exclusive: bool,
    /// Exclude members scoring exactly --max
    #[arg(long)]
    max_exclusive: bool,
}

impl Bounds {
    fn min(&self) -> ScoreBound {
        ScoreBound {
            value: self.min,
            inclusive: !self.min_exclusive,
        }
    }

    fn max(&self) -> ScoreBound {
        ScoreBound {
            value: self.max,
            inclusive: !self.max_exclusive,
        }
    }
}

#[derive(clap::Args)]
struct Store {
    dst: String,
    #[arg(required = true)]
    keys: Vec<String>,
    /// One weight per key
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    weights: Option<Vec<f64>>,
    /// sum, min or max
    #[arg(long, default_value = "sum", value_parser = parse_aggregate)]
    aggregate: Aggregate,
}

fn parse_aggregate(s: &str) -> Result<Aggregate, String> {
    match s.to_ascii_lowercase().as_str() {
        "sum" => Ok(Aggregate::Sum),
        "min" => Ok(Aggregate::Min),
        "max" => Ok(Aggregate::Max),
        other => Err(format!("unknown aggregate '{}'", other)),
    }
}

fn parse_pairs(pairs: &[String]) -> anyhow::Result<Vec<(f64, String)>> {
    if pairs.len() % 2 != 0 {
        bail!("expected SCORE MEMBER pairs, got {} values", pairs.len());
    }
    pairs
        .chunks(2)
        .map(|pair| {
            let score = pair[0]
                .parse::<f64>()
                .with_context(|| format!("invalid score '{}'", pair[0]))?;
            Ok((score, pair[1].clone()))
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args = Args::parse();

    match &args.command {
        Cmd::Zadd { key, pairs } => {
            let mut pairs = parse_pairs(pairs)?.into_iter();
            let Some((score, member)) = pairs.next() else {
                bail!("ZADD needs at least one SCORE MEMBER pair");
            };
            let command = ZAdd::new(key, score, member).pairs(pairs);
            run(&args, command, print_integer).await
        }
        Cmd::Zrem { key, members } => {
            let mut members = members.iter();
            let Some(first) = members.next() else {
                bail!("ZREM needs at least one member");
            };
            let command = members.fold(ZRem::new(key, first), |cmd, m| cmd.and(m));
            run(&args, command, print_integer).await
        }
        Cmd::Zincrby {
            key,
            increment,
            member,
        } => run(&args, ZIncrBy::new(key, *increment, member), print_score).await,
        Cmd::Zcard { key } => run(&args, ZCard::new(key), print_integer).await,
        Cmd::Zscore { key, member } => run(&args, ZScore::new(key, member), print_score).await,
        Cmd::Zrange {
            key,
            start,
            stop,
            rev,
            withscores,
        } => {
            let mut range = ZRange::new(key).span(*start, *stop).decode_as::<String>();
            if *rev {
                range = range.rev();
            }
            if *withscores {
                run(&args, range.with_scores(), print_scored).await
            } else {
                run(&args, range, print_members).await
            }
        }
        Cmd::Zrangebyscore {
            key,
            bounds,
            limit,
            rev,
            withscores,
        } => {
            let mut range = ZRangeByScore::new(key)
                .min(bounds.min())
                .max(bounds.max())
                .decode_as::<String>();
            if let Some(limit) = limit {
                range = range.limit(limit[0], limit[1]);
            }
            if *rev {
                range = range.rev();
            }
            if *withscores {
                run(&args, range.with_scores(), print_scored).await
            } else {
                run(&args, range, print_members).await
            }
        }
        Cmd::Zcount { key, bounds } => {
            let command = ZCount::new(key).min(bounds.min()).max(bounds.max());
            run(&args, command, print_integer).await
        }
        Cmd::Zrank { key, member, rev } => {
            let mut command = ZRank::new(key, member);
            if *rev {
                command = command.rev();
            }
            run(&args, command, print_optional_integer).await
        }
        Cmd::Zremrangebyrank { key, start, stop } => {
            run(&args, ZRemRangeByRank::new(key, *start, *stop), print_integer).await
        }
        Cmd::Zremrangebyscore { key, min, max } => {
            run(&args, ZRemRangeByScore::new(key, *min, *max), print_integer).await
        }
        Cmd::Zunionstore(store) => run_store(&args, SetOp::Union, store).await,
        Cmd::Zinterstore(store) => run_store(&args, SetOp::Intersect, store).await,
    }
}

async fn run_store(args: &Args, op: SetOp, store: &Store) -> anyhow::Result<()> {
    let command = ZStore::new(op, &store.dst, &store.keys).aggregate(store.aggregate);
    match &store.weights {
        Some(weights) => {
            if weights.len() != store.keys.len() {
                bail!(
                    "got {} weights for {} keys",
                    weights.len(),
                    store.keys.len()
                );
            }
            run(args, command.weights(weights.iter().copied()), print_integer).await
        }
        None => run(args, command, print_integer).await,
    }
}

async fn run<C: Command>(args: &Args, command: C, render: fn(C::Output)) -> anyhow::Result<()> {
    if args.dry_run {
        let line: Vec<String> = command
            .line()
            .iter()
            .map(|t| String::from_utf8_lossy(t).into_owned())
            .collect();
        println!("{}", line.join(" "));
        return Ok(());
    }

    let config = ClientConfig::new()
        .addr(&args.addr)
        .response_timeout_ms(args.timeout_ms);
    let mut client = Client::connect(&config)
        .await
        .with_context(|| format!("could not connect to {}", args.addr))?;

    let output = client.send(&command).await?;
    render(output);
    Ok(())
}

fn print_integer(n: i64) {
    println!("(integer) {}", n);
}

fn print_optional_integer(n: Option<i64>) {
    match n {
        Some(n) => print_integer(n),
        None => println!("(nil)"),
    }
}

fn print_score(score: Option<f64>) {
    match score {
        Some(score) => println!("\"{}\"", format_score(score)),
        None => println!("(nil)"),
    }
}

fn print_members(members: Vec<String>) {
    if members.is_empty() {
        println!("(empty array)");
    }
    for (i, member) in members.iter().enumerate() {
        println!("{}) \"{}\"", i + 1, member);
    }
}

fn print_scored(members: Vec<ZMember<String>>) {
    let flat: Vec<String> = members
        .into_iter()
        .flat_map(|m| [m.member, format_score(m.score)])
        .collect();
    print_members(flat);
}
