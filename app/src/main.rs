// isle - headless front end: grow an island scene from a TOML file,
// write previews and meshes, keep terrain snapshots in a store.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use isle_core::{
    Mesh, OceanModel, SceneConfig, TerrainGenerator, Tree, build_ocean, render_preview,
    scatter_trees,
};
use isle_storage::models::TerrainSnapshot;
use isle_storage::{SceneStore, write_obj};
use log::info;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

// Shoreline height used for the preview colours
const PREVIEW_SEA_LEVEL: f32 = 0.2;
const OCEAN_STEP: f32 = 1.0 / 30.0;

#[derive(Parser)]
#[command(name = "isle")]
#[command(about = "Procedural island scenes: terrain, ocean and trees", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a scene file holding every default
    Init {
        /// Path of the new scene file
        path: PathBuf,
    },

    /// Generate a scene: preview image plus OBJ meshes
    Generate {
        /// Scene file (defaults when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(long, default_value = "out")]
        out: PathBuf,

        /// Override the scene seed
        #[arg(long)]
        seed: Option<u64>,

        /// Ocean steps of 1/30 s to simulate before export
        #[arg(long, default_value_t = 0)]
        frames: u32,
    },

    /// Generate the terrain and store it as a snapshot
    Save {
        /// Snapshot name
        name: String,

        /// Scene file (defaults when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Render a stored snapshot to a PNG preview
    Load {
        /// Snapshot name
        name: String,

        /// Output image
        #[arg(long, default_value = "snapshot.png")]
        out: PathBuf,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// List stored snapshots
    List {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Remove a stored snapshot
    Delete {
        /// Snapshot name
        name: String,

        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Args)]
struct StoreArgs {
    /// MongoDB connection string
    #[arg(long, env = "ISLE_MONGODB_URI", default_value = "mongodb://localhost:27017")]
    uri: String,

    /// Database name
    #[arg(long, default_value = "isle")]
    db: String,

    /// Snapshot collection
    #[arg(long, default_value = "snapshots")]
    collection: String,
}

impl StoreArgs {
    async fn open(&self) -> Result<SceneStore> {
        SceneStore::init(&self.uri, &self.db, &self.collection)
            .await
            .with_context(|| format!("Failed to open store {}/{}", self.db, self.collection))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Init { path } => init(&path),
        Commands::Generate {
            config,
            out,
            seed,
            frames,
        } => generate(config.as_deref(), &out, seed, frames),
        Commands::Save {
            name,
            config,
            store,
        } => save(&name, config.as_deref(), &store).await,
        Commands::Load { name, out, store } => load(&name, &out, &store).await,
        Commands::List { store } => list(&store).await,
        Commands::Delete { name, store } => delete(&name, &store).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<SceneConfig> {
    let Some(path) = path else {
        return Ok(SceneConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene file: {}", path.display()))?;
    SceneConfig::from_toml_str(&text)
        .with_context(|| format!("Invalid scene file: {}", path.display()))
}

fn init(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Scene file already exists: {}", path.display());
    }
    let text = SceneConfig::default().to_toml_string()?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created scene file: {}", path.display());
    Ok(())
}

fn write_mesh(mesh: &Mesh, name: &str, dir: &Path) -> Result<()> {
    let path = dir.join(format!("{name}.obj"));
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_obj(mesh, name, BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(
        "wrote {} ({} vertices, {} triangles)",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(())
}

fn generate(config: Option<&Path>, out: &Path, seed: Option<u64>, frames: u32) -> Result<()> {
    let mut config = load_config(config)?;
    if let Some(seed) = seed {
        config.seed = seed;
    }
    fs::create_dir_all(out).with_context(|| format!("Failed to create {}", out.display()))?;
    let mut rng = Pcg64Mcg::seed_from_u64(config.seed);

    let start = Instant::now();
    let terrain = TerrainGenerator::from_config(&config.terrain)?;
    info!(
        "terrain {}x{} in {:.1} ms",
        terrain.width(),
        terrain.height(),
        start.elapsed().as_secs_f32() * 1000.0
    );

    let preview_path = out.join("preview.png");
    render_preview(terrain.height_map(), PREVIEW_SEA_LEVEL)
        .save(&preview_path)
        .with_context(|| format!("Failed to save {}", preview_path.display()))?;
    info!("wrote {}", preview_path.display());
    write_mesh(terrain.mesh(), "terrain", out)?;

    // Each tree gets its own seed so the forest is varied but reproducible
    let start = Instant::now();
    let sites = scatter_trees(&terrain, &config.placement, &mut rng);
    let mut trunks = Mesh::default();
    let mut branches = Mesh::default();
    let mut leaves = Mesh::default();
    for (i, site) in sites.iter().enumerate() {
        let mut tree = Tree::with_seed(config.tree.clone(), config.seed.wrapping_add(i as u64))?;
        tree.set_position(site.position);
        tree.set_rotation(site.rotation)?;
        tree.ensure_generated();

        let model = tree.model_matrix();
        trunks.merge(&tree.trunk_mesh().transformed(model));
        branches.merge(&tree.branches_mesh().transformed(model));
        leaves.merge(&tree.leaves_mesh().transformed(model));
    }
    info!(
        "{} trees in {:.1} ms",
        sites.len(),
        start.elapsed().as_secs_f32() * 1000.0
    );
    write_mesh(&trunks, "trunks", out)?;
    write_mesh(&branches, "branches", out)?;
    if !leaves.is_empty() {
        write_mesh(&leaves, "leaves", out)?;
    }

    let start = Instant::now();
    let mut ocean = build_ocean(&config.ocean, &mut rng)?;
    for _ in 0..frames {
        ocean.update(OCEAN_STEP);
    }
    info!(
        "ocean after {} steps ({:.2} s simulated) in {:.1} ms",
        frames,
        ocean.time(),
        start.elapsed().as_secs_f32() * 1000.0
    );
    write_mesh(ocean.mesh(), "ocean", out)?;

    println!("Scene written to {}", out.display());
    Ok(())
}

async fn save(name: &str, config: Option<&Path>, args: &StoreArgs) -> Result<()> {
    let config = load_config(config)?;
    let terrain = TerrainGenerator::from_config(&config.terrain)?;
    let store = args.open().await?;
    store
        .create(&TerrainSnapshot::from_terrain(name, config.seed, &terrain))
        .await?;
    println!("Saved snapshot {name:?}");
    Ok(())
}

async fn load(name: &str, out: &Path, args: &StoreArgs) -> Result<()> {
    let store = args.open().await?;
    let Some(snapshot) = store.read_by_name(name).await? else {
        bail!("No snapshot named {name:?}");
    };
    if !snapshot.is_consistent() {
        bail!(
            "Snapshot {name:?} holds {} heights, expected {}x{}",
            snapshot.height_map.len(),
            snapshot.width,
            snapshot.height
        );
    }
    render_preview(&snapshot.to_height_map(), PREVIEW_SEA_LEVEL)
        .save(out)
        .with_context(|| format!("Failed to save {}", out.display()))?;
    println!(
        "Loaded {name:?} ({}x{}, seed {}) -> {}",
        snapshot.width,
        snapshot.height,
        snapshot.seed,
        out.display()
    );
    Ok(())
}

async fn list(args: &StoreArgs) -> Result<()> {
    let store = args.open().await?;
    let names = store.list_names().await?;
    if names.is_empty() {
        println!("No snapshots in {}/{}", args.db, args.collection);
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

async fn delete(name: &str, args: &StoreArgs) -> Result<()> {
    let store = args.open().await?;
    if !store.delete_by_name(name).await? {
        bail!("No snapshot named {name:?}");
    }
    println!("Deleted snapshot {name:?}");
    Ok(())
}
