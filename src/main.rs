//! Coilnet - Transformer Winding Network Builder
//!
//! Builds the lumped network of a winding design and prints its matrices.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=info coilnet design.json
//! ```

use std::path::PathBuf;

use clap::Parser;
use coilnet::{error::Result, Design, Matrix, NetworkModel};

/// Transformer winding network builder
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the design description (.json)
    #[arg(value_name = "DESIGN_FILE")]
    design_file: PathBuf,

    /// Print the inductance matrix as well
    #[arg(short, long)]
    inductance: bool,

    /// Merge explicitly connected nodes before printing the capacitance matrix
    #[arg(short, long)]
    fixed: bool,
}

fn print_matrix(title: &str, m: &Matrix) -> Result<()> {
    println!("{} ({}x{}):", title, m.rows(), m.columns());
    for i in 0..m.rows() {
        let row = (0..m.columns())
            .map(|j| m.get(i, j).map(|v| format!("{:>13.5e}", v)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        println!("{}", row.join(" "));
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Load and build
    let design = Design::from_file(&args.design_file)?;
    let mut model = NetworkModel::from_design(design)?;

    model.compute_series_capacitances()?;
    let tops = model.set_nodes()?;
    println!(
        "{} coils, {} winding segments, {} nodes (coil top nodes: {:?})",
        model.coil_count(),
        model.winding_count(),
        model.nodes().map_or(0, |n| n.len()),
        tops
    );

    if args.fixed {
        let fixed = model.fixed_capacitance_matrix()?;
        print_matrix("Capacitance [F], connected nodes merged", &fixed.matrix)?;
    } else {
        print_matrix("Capacitance [F]", model.capacitance_matrix()?)?;
    }

    if args.inductance {
        print_matrix("Inductance [H]", model.inductance_matrix()?)?;
    }

    Ok(())
}
