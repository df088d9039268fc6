use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use spn_rs::data::DataMatrix;
use spn_rs::dispatch::NetworkType;
use spn_rs::leaves::Gaussian;
use spn_rs::reference::NodeId;
use spn_rs::spn::{Spn, SpnConfig};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of variables.
    #[arg(value_name = "INT", default_value = "8")]
    vars: usize,

    /// Number of children of every sum node.
    #[clap(long, value_name = "INT", default_value = "2")]
    mixtures: usize,

    /// Number of data rows.
    #[clap(long, value_name = "INT", default_value = "5")]
    rows: usize,

    /// Probability of a cell being missing.
    #[clap(long, value_name = "FLOAT", default_value = "0.2")]
    missing: f64,

    /// Random seed.
    #[clap(long, value_name = "INT", default_value = "42")]
    seed: u64,

    /// Print the network as a tree.
    #[clap(long)]
    tree: bool,
}

/// Random network over `scope`: a sum of products that split the scope in halves.
fn build(spn: &mut Spn, scope: &[usize], mixtures: usize) -> color_eyre::Result<NodeId> {
    color_eyre::eyre::ensure!(!scope.is_empty(), "Cannot build a network over no variables");
    color_eyre::eyre::ensure!(mixtures > 0, "Sum nodes need at least one child");
    if let [v] = scope {
        let mean = spn.rng().random_range(-2.0..2.0);
        let stdev = spn.rng().random_range(0.5..2.0);
        return Ok(spn.mk_leaf(&[*v], Gaussian::new(mean, stdev)?)?);
    }
    let (left, right) = scope.split_at(scope.len() / 2);
    let mut products = Vec::with_capacity(mixtures);
    for _ in 0..mixtures {
        let a = build(spn, left, mixtures)?;
        let b = build(spn, right, mixtures)?;
        products.push(spn.mk_product(&[a, b], scope)?);
    }
    Ok(spn.mk_sum(&products, scope, None)?)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);
    color_eyre::eyre::ensure!(args.vars > 0, "At least one variable is required");
    color_eyre::eyre::ensure!(args.mixtures > 0, "Sum nodes need at least one child");

    let mut spn = Spn::with_config(SpnConfig::default().with_seed(args.seed));
    let scope: Vec<usize> = (0..args.vars).collect();
    let root = build(&mut spn, &scope, args.mixtures)?;
    spn.set_node_ids(root)?;
    println!("spn = {:?}", spn);

    let (sums, products, leaves) = spn.node_counts(root);
    println!(
        "Network with {} sums, {} products, {} leaves and {} induced trees",
        sums,
        products,
        leaves,
        spn.count_induced_trees(root)?
    );
    if args.tree {
        spn.print_treelike(root);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut data = DataMatrix::missing(args.rows, args.vars);
    for r in 0..args.rows {
        for c in 0..args.vars {
            if !rng.random_bool(args.missing) {
                data.set(r, c, rng.random_range(-3.0..3.0));
            }
        }
    }
    println!("data:\n{}", data);

    let lik = spn.likelihood(NetworkType::Spn, root, &data)?;
    let log_lik = spn.log_likelihood(NetworkType::Spn, root, &data)?;
    for (r, (l, ll)) in lik.iter().zip(&log_lik).enumerate() {
        println!("row {}: likelihood = {:.6e}, log-likelihood = {:.6}", r, l, ll);
    }

    let gradients = spn.log_gradients(root, &data)?;
    for &leaf in spn.leaves(root).iter().take(3) {
        println!("ln d root / d {} = {:?}", spn.node(leaf), gradients[&leaf]);
    }

    let completed = spn.sample(root, &data, &mut rng)?;
    println!("completed:\n{}", completed);

    let time_total = time_total.elapsed();
    println!("Done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
