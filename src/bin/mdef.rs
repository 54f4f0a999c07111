use filebuffer::FileBuffer;
use mdeflate_rs::{compress_buffer, decompress_buffer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::exit;
use structopt::StructOpt;

#[derive(StructOpt)]
struct MdefParams {
    /// 'c' to compress, 'd' to decompress
    mode: String,
    input: PathBuf,
    output: PathBuf,
    /// Run the codec without writing the output file
    #[structopt(short)]
    simulate: bool,
}

fn main() {
    let params: MdefParams = MdefParams::from_args();

    let data = match FileBuffer::open(&params.input) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("unable to open {} for reading: {}", params.input.display(), err);
            exit(1);
        }
    };

    let mut writer = if params.simulate {
        None
    } else {
        match File::create(&params.output) {
            Ok(file) => Some(BufWriter::new(file)),
            Err(err) => {
                eprintln!(
                    "unable to open {} for writing: {}",
                    params.output.display(),
                    err
                );
                exit(1);
            }
        }
    };

    let mut out_bytes = 0usize;
    let mut sink = |block: &[u8]| {
        out_bytes += block.len();
        match &mut writer {
            Some(writer) => writer.write_all(block).map_err(|_| ()),
            None => Ok(()),
        }
    };

    match params.mode.as_str() {
        "c" => match compress_buffer(&data, &mut sink) {
            Ok(()) => {
                println!(
                    "{} {} ( {:.2} )",
                    data.len(),
                    out_bytes,
                    out_bytes as f64 / data.len().max(1) as f64
                );
            }
            Err(err) => {
                eprintln!("compression failed: {:?}", err);
                exit(1);
            }
        },
        "d" => match decompress_buffer(&data, &mut sink) {
            Ok(result) => {
                println!(
                    "{} -> {} ( crc32 {:08x} )",
                    data.len(),
                    result.written,
                    result.crc32
                );
            }
            Err(err) => {
                eprintln!("decompression failed: {:?}", err);
                exit(1);
            }
        },
        _ => {
            eprintln!("usage: mdef <c|d> <infile> <outfile>");
            exit(1);
        }
    }
}
