use log::{debug, info, warn};

use cover_core::arcfour::MAX_KEY_SIZE;
use cover_core::keys::{expand_password, DEFAULT_PASSWORD};
use cover_core::{Container, CoverError, Eph5};

use crate::cli::{Eph5Analyze, Eph5Command, Eph5Embed, Eph5Extract};
use crate::error::{read_file, write_file, CliError, Result};

pub fn run(command: Eph5Command) -> Result<()> {
    match command {
        Eph5Command::Analyze(args) => analyze(args),
        Eph5Command::Embed(args) => embed(args),
        Eph5Command::Extract(args) => extract(args),
    }
}

fn key_for(password: Option<String>) -> Vec<u8> {
    match password {
        Some(p) => expand_password(&p, MAX_KEY_SIZE),
        None => expand_password(DEFAULT_PASSWORD, MAX_KEY_SIZE),
    }
}

fn analyze(args: Eph5Analyze) -> Result<()> {
    let data = read_file(&args.image)?;
    let container = Container::read(&data)?;
    let key = key_for(args.password);
    let eph5 = Eph5::initialize(&container, &key);
    let capacities = eph5.capacities();

    println!("width_in_blocks: {}", container.width_in_blocks());
    println!("height_in_blocks: {}", container.height_in_blocks());
    println!("coefficients_count: {}", container.coefficients_count());
    println!("usable_count: {}", eph5.usable_count());
    println!("one_count: {}", eph5.one_count());
    for k in 1u8..=7 {
        let idx = k as usize - 1;
        println!(
            "k={k}: guaranteed={} maximum={} expected={:.1}",
            capacities.guaranteed[idx], capacities.maximum[idx], capacities.expected[idx]
        );
    }
    Ok(())
}

fn embed(args: Eph5Embed) -> Result<()> {
    let data = read_file(&args.data)?;
    let container_bytes = read_file(&args.container)?;
    let mut container = Container::read(&container_bytes)?;
    let key = key_for(args.password);
    let eph5 = Eph5::initialize(&container, &key);

    let mut k = match (args.k, args.auto) {
        (Some(k), _) => k,
        (None, true) => auto_k(&eph5, data.len()),
        (None, false) => {
            return Err(CliError::InvalidArgument("either -k or --auto is required".into()))
        }
    };

    loop {
        let mut eph5 = Eph5::initialize(&container, &key);
        debug!("attempting embed with k={k}, payload {} bytes", data.len());
        let embedded = eph5.embed(&data, k);
        if embedded < data.len() {
            if args.fit && k > 1 {
                warn!("k={k} only fit {embedded}/{} bytes, retrying with k={}", data.len(), k - 1);
                k -= 1;
                continue;
            }
            return Err(CoverError::CapacityExceeded {
                requested: data.len(),
                embedded,
            }
            .into());
        }
        let changed = eph5.apply(&mut container);
        info!("embedded {embedded} bytes at k={k}, {changed} coefficients changed");
        break;
    }

    write_file(&args.out, &container.write()?)
}

fn auto_k(eph5: &Eph5, payload_len: usize) -> u8 {
    let capacities = eph5.capacities();
    (1u8..=7)
        .rev()
        .find(|&k| capacities.expected[k as usize - 1] >= payload_len as f64)
        .unwrap_or(7)
}

fn extract(args: Eph5Extract) -> Result<()> {
    let data = read_file(&args.container)?;
    let container = Container::read(&data)?;
    let key = key_for(args.password);
    let eph5 = Eph5::initialize(&container, &key);

    for (k, stream) in eph5.extract_all().into_iter().enumerate() {
        let path = args.out_prefix.with_extension((k + 1).to_string());
        write_file(&path, &stream)?;
    }
    Ok(())
}
