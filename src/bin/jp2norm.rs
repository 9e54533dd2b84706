//! jp2norm CLI - JPEG 2000 component normalization utility.
//!
//! Assembles decoded component planes (PGX) into an image, converts it to
//! canonical 8-bit RGB and writes it as PPM, PAM or raw RGBA.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jp2norm::{
    ColorSpace, Image, Jp2Reader, NormalizeOptions, Normalizer, PixelLayout, PrecisionMode,
    interleave_rgb8, pack_rgba32, read_pgx,
};

/// Normalize JPEG 2000 component planes to 8-bit RGB
#[derive(Parser)]
#[command(name = "jp2norm")]
#[command(version)]
#[command(about = "Color space and bit-depth normalization for decoded JPEG 2000 images", long_about = None)]
#[command(after_help = "EXAMPLES:
    jp2norm normalize -c y.pgx -c cb.pgx -c cr.pgx --subsampling 1x1 2x2 2x2 -o out.ppm
    jp2norm normalize -c c.pgx -c m.pgx -c y.pgx -c k.pgx --color-space cmyk -o out.ppm
    jp2norm normalize -c r.pgx -c g.pgx -c b.pgx -c a.pgx --alpha 3 -o out.pam -f pam
    jp2norm info -i image.jp2")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize component planes to 8-bit RGB
    ///
    /// Components are taken in the order given. The declared color space
    /// comes from --color-space, or from the colour specification of the
    /// JP2 file given with --header.
    #[command(visible_alias = "n")]
    Normalize {
        /// Component files in PGX format
        #[arg(short, long = "component", required = true, num_args = 1..)]
        components: Vec<PathBuf>,

        /// Subsampling factors per component (DXxDY), defaults to 1x1
        #[arg(long, num_args = 1.., value_parser = parse_subsampling)]
        subsampling: Vec<(u32, u32)>,

        /// Image origin on the reference grid (X,Y)
        #[arg(long, value_parser = parse_origin)]
        origin: Option<(u32, u32)>,

        /// Declared color space
        #[arg(long, value_enum)]
        color_space: Option<ColorSpaceArg>,

        /// JP2 file whose header provides the color space and ICC profile
        #[arg(long)]
        header: Option<PathBuf>,

        /// Index of the component holding opacity
        #[arg(long)]
        alpha: Option<usize>,

        /// How samples are brought to 8 bits
        #[arg(long, default_value = "scale", value_enum)]
        precision_mode: PrecisionModeArg,

        /// Keep subsampled extra components as they are
        #[arg(long)]
        no_upsample: bool,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "ppm", value_enum)]
        format: OutputFormat,
    },

    /// Display JP2 header and colour specification
    #[command(visible_alias = "i")]
    Info {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Portable PixMap (P6)
    Ppm,
    /// Portable Arbitrary Map with alpha (RGB_ALPHA)
    Pam,
    /// Raw RGBA bytes
    Raw,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorSpaceArg {
    Unknown,
    Srgb,
    Gray,
    Sycc,
    Eycc,
    Cmyk,
}

impl From<ColorSpaceArg> for ColorSpace {
    fn from(arg: ColorSpaceArg) -> Self {
        match arg {
            ColorSpaceArg::Unknown => ColorSpace::Unknown,
            ColorSpaceArg::Srgb => ColorSpace::Srgb,
            ColorSpaceArg::Gray => ColorSpace::Gray,
            ColorSpaceArg::Sycc => ColorSpace::Sycc,
            ColorSpaceArg::Eycc => ColorSpace::Eycc,
            ColorSpaceArg::Cmyk => ColorSpace::Cmyk,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PrecisionModeArg {
    /// Rescale to the full 8-bit range
    Scale,
    /// Clamp into the 8-bit range
    Clip,
}

impl From<PrecisionModeArg> for PrecisionMode {
    fn from(arg: PrecisionModeArg) -> Self {
        match arg {
            PrecisionModeArg::Scale => PrecisionMode::Scale,
            PrecisionModeArg::Clip => PrecisionMode::Clip,
        }
    }
}

struct NormalizeArgs {
    components: Vec<PathBuf>,
    subsampling: Vec<(u32, u32)>,
    origin: Option<(u32, u32)>,
    color_space: Option<ColorSpaceArg>,
    header: Option<PathBuf>,
    alpha: Option<usize>,
    options: NormalizeOptions,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jp2norm=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Normalize {
            components,
            subsampling,
            origin,
            color_space,
            header,
            alpha,
            precision_mode,
            no_upsample,
            output,
            format,
        } => {
            let args = NormalizeArgs {
                components,
                subsampling,
                origin,
                color_space,
                header,
                alpha,
                options: NormalizeOptions {
                    precision_mode: precision_mode.into(),
                    upsample: !no_upsample,
                    ..Default::default()
                },
            };
            normalize_image(&args, &output, format)
        }
        Commands::Info { input } => show_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn normalize_image(
    args: &NormalizeArgs,
    output: &Path,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = assemble_image(args)?;
    let image = Normalizer::new(args.options).normalize(image)?;
    let (width, height) = (image.components[0].width, image.components[0].height);

    match format {
        OutputFormat::Ppm => {
            let pixels = interleave_rgb8(&image)?;
            let mut file = fs::File::create(output)?;
            writeln!(file, "P6")?;
            writeln!(file, "{} {}", width, height)?;
            writeln!(file, "255")?;
            file.write_all(&pixels)?;
        }
        OutputFormat::Pam => {
            let pixels = pack_rgba32(&image, PixelLayout::RGBA)?;
            let mut file = fs::File::create(output)?;
            writeln!(file, "P7")?;
            writeln!(file, "WIDTH {}", width)?;
            writeln!(file, "HEIGHT {}", height)?;
            writeln!(file, "DEPTH 4")?;
            writeln!(file, "MAXVAL 255")?;
            writeln!(file, "TUPLTYPE RGB_ALPHA")?;
            writeln!(file, "ENDHDR")?;
            file.write_all(&pixels)?;
        }
        OutputFormat::Raw => {
            fs::write(output, pack_rgba32(&image, PixelLayout::RGBA)?)?;
        }
    }

    println!(
        "✓ Normalized {}x{} image ({} components) to {:?}",
        width,
        height,
        image.component_count(),
        output
    );
    Ok(())
}

fn assemble_image(args: &NormalizeArgs) -> Result<Image, Box<dyn std::error::Error>> {
    if args.subsampling.len() > args.components.len() {
        return Err("more subsampling factors than components".into());
    }

    let mut components = Vec::with_capacity(args.components.len());
    for (index, path) in args.components.iter().enumerate() {
        let (dx, dy) = args.subsampling.get(index).copied().unwrap_or((1, 1));
        let mut component = read_pgx(&fs::read(path)?)?.with_subsampling(dx, dy);
        component.is_alpha = args.alpha == Some(index);
        components.push(component);
    }

    let mut color_space = ColorSpace::Unknown;
    let mut icc_profile = None;
    if let Some(header_path) = &args.header {
        let data = fs::read(header_path)?;
        let header = Jp2Reader::new(&data)
            .read_header()?
            .ok_or("header file is not a JP2 container")?;
        if let Some(colour) = header.colour {
            color_space = colour.color_space();
            icc_profile = colour.icc_profile;
        }
    }
    if let Some(arg) = args.color_space {
        color_space = arg.into();
    }

    let mut image = Image::new(components, color_space);
    image.icc_profile = icc_profile;
    if let Some((x0, y0)) = args.origin {
        image = image.with_origin(x0, y0);
    }
    Ok(image)
}

fn show_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;

    println!("File: {:?}", input);
    println!("Size: {} bytes", data.len());
    println!();

    let Some(header) = Jp2Reader::new(&data).read_header()? else {
        println!("Format: Not a JP2 container");
        return Ok(());
    };

    println!("Format: JP2 Container (JPEG 2000)");
    let mut boxes = Jp2Reader::new(&data);
    while let Some(b) = boxes.read_box()? {
        println!(
            "  Box {:<10} {} bytes",
            format!("'{}'", String::from_utf8_lossy(&b.box_type)),
            b.length
        );
    }
    if let Some(ihdr) = &header.image_header {
        println!("  Dimensions: {}x{}", ihdr.width, ihdr.height);
        println!("  Components: {}", ihdr.component_count);
        match ihdr.bits_per_component {
            Some(bits) => println!(
                "  Bit depth:  {} bits ({})",
                bits,
                if ihdr.is_signed { "signed" } else { "unsigned" }
            ),
            None => println!("  Bit depth:  varies per component"),
        }
    }
    if let Some(colour) = &header.colour {
        match colour.enumerated {
            Some(value) => println!(
                "  Color space: {:?} (EnumCS {})",
                colour.color_space(),
                value
            ),
            None => println!("  Color space: method {}", colour.method),
        }
        if let Some(icc) = &colour.icc_profile {
            println!("  ICC Profile: {} bytes", icc.len());
        }
    }
    println!(
        "  Codestream: {}",
        if header.has_codestream { "Present" } else { "Missing" }
    );
    Ok(())
}

fn parse_subsampling(value: &str) -> Result<(u32, u32), String> {
    let (dx, dy) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected DXxDY, got '{value}'"))?;
    let dx: u32 = dx.parse().map_err(|_| format!("invalid dx '{dx}'"))?;
    let dy: u32 = dy.parse().map_err(|_| format!("invalid dy '{dy}'"))?;
    if dx == 0 || dy == 0 {
        return Err("subsampling factors must be at least 1".into());
    }
    Ok((dx, dy))
}

fn parse_origin(value: &str) -> Result<(u32, u32), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{value}'"))?;
    let x = x.trim().parse().map_err(|_| format!("invalid x '{x}'"))?;
    let y = y.trim().parse().map_err(|_| format!("invalid y '{y}'"))?;
    Ok((x, y))
}
