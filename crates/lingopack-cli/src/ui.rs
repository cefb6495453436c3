use color_eyre::eyre::Result;
use lingopack_core::EngineError;
use serde::Serialize;

#[derive(Serialize)]
struct OkEnvelope<'a, T: Serialize> {
    ok: bool,
    data: &'a T,
}

#[derive(Serialize)]
struct ErrEnvelope {
    ok: bool,
    error: lingopack_domain::ErrorBody,
}

/// Print the `{ok:true, data}` envelope as one line on stdout.
pub fn print_ok<T: Serialize>(data: &T) -> Result<()> {
    let line = serde_json::to_string(&OkEnvelope { ok: true, data })?;
    println!("{line}");
    Ok(())
}

/// Print the `{ok:false, error}` envelope and exit with code 1.
pub fn fail_json(err: &EngineError) -> ! {
    let envelope = ErrEnvelope {
        ok: false,
        error: lingopack_services::error_body(err),
    };
    match serde_json::to_string(&envelope) {
        Ok(line) => println!("{line}"),
        Err(e) => eprintln!("error: {e}"),
    }
    std::process::exit(1);
}

/// Structured errors go out as the JSON envelope in json mode; in text mode
/// they bubble up to color-eyre.
pub fn finish<T: Serialize>(format: &str, result: lingopack_core::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(data) => {
            if format == "json" {
                print_ok(&data)?;
            }
            Ok(Some(data))
        }
        Err(e) if format == "json" => fail_json(&e),
        Err(e) => Err(e.into()),
    }
}
