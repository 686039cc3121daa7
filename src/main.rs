#[cfg(not(feature = "render"))]
fn main() {
    eprintln!(
        "The namco-wsg-render binary requires the \"render\" feature. Rebuild with `--features render` to enable WAV output."
    );
}

#[cfg(feature = "render")]
fn main() -> anyhow::Result<()> {
    cli::run()
}

#[cfg(feature = "render")]
mod cli {
    //! Offline renderer: plays a short arpeggio and portamento phrase through
    //! the dispatcher and writes the chip output to a 16-bit stereo WAV.

    use std::fs::{self, File};
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use clap::Parser;

    use namco_wsg::{
        Command, CommandKind, DeviceType, DispatchConfig, DispatchContext, Instrument,
        MacroSequence, Wavetable, WsgDispatch, STATUS_PORTA_DONE,
    };

    /// Frequency units per tick of the bass slide
    const PORTA_STEP: i32 = 24;

    #[derive(Parser)]
    #[command(name = "namco-wsg-render")]
    #[command(about = "Render a Namco WSG test phrase to a WAV file")]
    struct Args {
        /// Output WAV file
        #[arg(short, long, default_value = "namco-wsg.wav")]
        output: PathBuf,

        /// Chip variant (pacman, polepos, 15xx, cus30)
        #[arg(short, long)]
        device: Option<DeviceType>,

        /// JSON dispatcher configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Lead note (57 = A-4)
        #[arg(short, long, default_value_t = 57)]
        note: i32,

        /// Engine ticks per second
        #[arg(long, default_value_t = 60.0)]
        tick_rate: f64,

        /// Length in seconds
        #[arg(long, default_value_t = 4.0)]
        seconds: f64,

        /// Also export the register writes as CSV
        #[arg(long)]
        dump_csv: Option<PathBuf>,

        /// Log specification (RUST_LOG syntax)
        #[arg(long, default_value = "info")]
        log: String,
    }

    fn demo_context() -> DispatchContext {
        let mut lead = Instrument::new("arp lead");
        lead.macros.arp = MacroSequence::new(vec![0, 4, 7, 12]).with_loop(0);
        lead.macros.vol = MacroSequence::new(vec![15, 14, 13, 12, 11, 10]).with_release(5);
        lead.wave_synth.enabled = true;
        lead.wave_synth.wave1 = 1;

        let mut bass = Instrument::new("bass");
        bass.wave_synth.enabled = true;
        bass.wave_synth.wave1 = 0;

        DispatchContext::new()
            .with_wavetable(Wavetable::triangle())
            .with_wavetable(Wavetable::square())
            .with_instrument(lead)
            .with_instrument(bass)
    }

    pub fn run() -> Result<()> {
        let args = Args::parse();
        let _logger = flexi_logger::Logger::try_with_env_or_str(&args.log)?.start()?;

        let mut config = match &args.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                DispatchConfig::from_json(&json)?
            }
            None => DispatchConfig::default(),
        };
        if let Some(device) = args.device {
            config.device = device;
        }
        if args.dump_csv.is_some() {
            config.dump_writes = true;
        }

        let mut wsg = WsgDispatch::from_config(&config, demo_context());
        let channels = wsg.init();
        let rate = wsg.rate();
        log::info!("{}: {} channels at {} Hz", config.device.name(), channels, rate);

        let samples_per_tick = ((rate as f64 / args.tick_rate).round() as usize).max(1);
        let ticks = (args.seconds * args.tick_rate) as usize;
        let bass_note = args.note - 12;
        let mut sliding = false;

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&args.output, spec)
            .with_context(|| format!("creating {}", args.output.display()))?;
        let mut left = vec![0i16; samples_per_tick];
        let mut right = vec![0i16; samples_per_tick];

        for t in 0..ticks {
            if t == 0 {
                wsg.try_dispatch(Command::instrument(0, 0))?;
                wsg.try_dispatch(Command::note_on(0, args.note))?;
                if channels > 1 {
                    wsg.try_dispatch(Command::instrument(1, 1))?;
                    wsg.try_dispatch(Command::note_on(1, bass_note))?;
                }
            } else if t == ticks / 4 && channels > 1 {
                wsg.try_dispatch(Command::with_values(CommandKind::PrePorta, 1, 1, 1))?;
                sliding = true;
            } else if t == ticks * 3 / 4 {
                for ch in 0..channels {
                    wsg.try_dispatch(Command::note_off(ch))?;
                }
            }

            if sliding {
                let status = wsg.try_dispatch(Command::note_porta(1, PORTA_STEP, bass_note - 5))?;
                if status == STATUS_PORTA_DONE {
                    wsg.try_dispatch(Command::new(CommandKind::PrePorta, 1))?;
                    sliding = false;
                    log::debug!("slide done at tick {t}");
                }
            }

            wsg.tick()?;
            wsg.acquire(&mut left, &mut right)?;
            for (&l, &r) in left.iter().zip(right.iter()) {
                writer.write_sample(l)?;
                writer.write_sample(r)?;
            }
        }
        writer.finalize()?;

        log::info!(
            "wrote {} ({:.1}s)",
            args.output.display(),
            wsg.cycles().elapsed_secs(rate)
        );

        if let Some(path) = &args.dump_csv {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            let rows = wsg.write_dump_csv(file)?;
            log::info!("wrote {rows} register writes to {}", path.display());
        }

        Ok(())
    }
}
