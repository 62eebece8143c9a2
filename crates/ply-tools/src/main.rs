//! `ply-info`: prints the header of a PLY file and, optionally, statistics of
//! the triangle mesh it contains.
//!
//! Set `RUST_LOG=debug` to trace element loading.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use ply_core::{Header, PlyError, PlyReader, PropertyKind};
use ply_io::{LoaderOptions, MeshError, PlyMesh};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "ply-info")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// PLY file to inspect
    input: PathBuf,

    /// Load every element and report its row count
    #[arg(short, long)]
    rows: bool,

    /// Load the triangle mesh and report vertex and triangle counts
    #[arg(short, long)]
    mesh: bool,

    /// Accept files without a face element when loading the mesh
    #[arg(long)]
    points: bool,

    /// Keep normals as stored instead of rescaling them to unit length
    #[arg(long)]
    raw_normals: bool,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Ply(#[from] PlyError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ply-info: {}: {}", args.input.display(), err);
            ExitCode::FAILURE
        }
    }
}

#[tracing::instrument(skip_all, fields(path = %args.input.display()))]
fn run(args: &Args) -> Result<(), CliError> {
    let mut reader = PlyReader::open(&args.input)?;
    info!(
        format = reader.header().format.as_str(),
        elements = reader.header().elements.len(),
        "parsed header"
    );
    print!("{}", describe_header(reader.header()));

    if args.rows {
        println!();
        while reader.has_element() {
            let element = reader.load_element()?;
            debug!(element = element.name(), rows = element.num_rows(), "loaded element");
            println!("{}: {} rows loaded", element.name(), element.num_rows());
            reader.next_element();
        }
    }

    if args.mesh {
        let options = LoaderOptions::new()
            .with_require_faces(!args.points)
            .with_normalize_normals(!args.raw_normals);
        let mesh = ply_io::load_with_options(&args.input, &options)?;
        println!();
        print!("{}", describe_mesh(&args.input, &mesh));
    }
    Ok(())
}

fn describe_header(header: &Header) -> String {
    let mut out = format!("format: {}\n", header.format.as_str());
    for comment in &header.comments {
        out.push_str(&format!("comment: {}\n", comment));
    }
    for info in &header.obj_info {
        out.push_str(&format!("obj_info: {}\n", info));
    }
    for element in &header.elements {
        out.push_str(&format!("element {} ({} rows)\n", element.name, element.count));
        for property in &element.properties {
            let ty = match property.kind {
                PropertyKind::Scalar(ty) => ty.to_string(),
                PropertyKind::List { count_type, value_type } => format!("list {} {}", count_type, value_type),
            };
            out.push_str(&format!("  {:<20} {}\n", property.name, ty));
        }
    }
    out
}

fn describe_mesh(path: &Path, mesh: &PlyMesh) -> String {
    let mut out = format!("mesh: {}\n", path.display());
    out.push_str(&format!("  vertices:  {}\n", mesh.num_vertices()));
    out.push_str(&format!("  triangles: {}\n", mesh.num_triangles()));
    out.push_str(&format!("  normals:   {}\n", if mesh.has_normals() { "yes" } else { "no" }));
    out.push_str(&format!("  texcoords: {}\n", if mesh.has_texcoords() { "yes" } else { "no" }));
    if let Some((min, max)) = bounds(&mesh.positions) {
        out.push_str(&format!("  bounds:    {:?} .. {:?}\n", min, max));
    }
    out
}

fn bounds(points: &[[f32; 3]]) -> Option<([f32; 3], [f32; 3])> {
    let first = *points.first()?;
    Some(points.iter().fold((first, first), |(mut min, mut max), p| {
        for k in 0..3 {
            min[k] = min[k].min(p[k]);
            max[k] = max[k].max(p[k]);
        }
        (min, max)
    }))
}
