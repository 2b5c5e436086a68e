use miette::Result;
use serde::Serialize;

#[derive(Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
    parser_version: &'static str,
}

pub fn run(json: bool) -> Result<()> {
    let info = VersionInfo {
        name: "yy",
        version: env!("CARGO_PKG_VERSION"),
        parser_version: yy_parser::VERSION,
    };

    if json {
        return super::print_json(&info);
    }

    println!("{} {}", info.name, info.version);
    Ok(())
}
