//! Synthesizes inverse and aggregate toggles for `enable_`/`disable_`
//! prefixed boolean-like flags. Runs once, at freeze time, over every
//! command; generated flags are ordinary arguments as far as the parser is
//! concerned.

use tracing::debug;

use crate::tree::{Arg, Cmd, Sink, ToggleTarget};
use crate::value::Ty;
use crate::Result;

pub(crate) fn add_complements(cmd: &mut Cmd) -> Result<()> {
    let mut rewires: Vec<(String, Sink)> = Vec::new();
    let mut additions: Vec<Arg> = Vec::new();
    // Declared enable/disable flags: (base key, declared with enable_, type).
    let mut recognized: Vec<(String, bool, Ty)> = Vec::new();

    for arg in cmd.args() {
        if !arg.is_flag() || arg.is_rest() || !arg.ty().is_boolish() {
            continue;
        }
        let (base, is_enable) = if let Some(suffix) = arg.name().strip_prefix("enable_") {
            (suffix.to_string(), true)
        } else if let Some(suffix) = arg.name().strip_prefix("disable_") {
            (suffix.to_string(), false)
        } else {
            continue;
        };
        // The declared flag writes its parsed value verbatim under the base
        // key; the synthesized counterpart writes it inverted.
        rewires.push((
            arg.name().to_string(),
            Sink::Toggle { target: base.clone(), invert: false },
        ));
        let opposite =
            if is_enable { format!("disable_{base}") } else { format!("enable_{base}") };
        if cmd.get_argument(&opposite).is_none() {
            additions.push(complement_flag(
                &opposite,
                arg.ty().clone(),
                Sink::Toggle { target: base.clone(), invert: true },
            ));
        }
        recognized.push((base, is_enable, arg.ty().clone()));
    }

    for (name, sink) in rewires {
        if let Some(arg) = cmd.arg_mut(&name) {
            arg.set_sink(sink);
        }
    }
    for arg in additions {
        debug!(command = cmd.name(), flag = arg.name(), "synthesized complement flag");
        cmd.add_arg(arg)?;
    }

    if !recognized.is_empty() {
        for (all_name, as_enabled) in [("enable_all", true), ("disable_all", false)] {
            if cmd.get_argument(all_name).is_some() {
                continue;
            }
            let targets = recognized
                .iter()
                .map(|(base, is_enable, ty)| ToggleTarget {
                    name: base.clone(),
                    invert: *is_enable != as_enabled,
                    ty: ty.clone(),
                })
                .collect();
            cmd.add_arg(complement_flag(all_name, Ty::Bool, Sink::ToggleAll { targets }))?;
        }
    }

    for sub in cmd.subcommands_mut() {
        add_complements(sub)?;
    }
    Ok(())
}

fn complement_flag(name: &str, ty: Ty, sink: Sink) -> Arg {
    let mut arg = Arg::new(name, ty);
    arg.set_flag();
    arg.set_optional();
    arg.set_sink(sink);
    arg
}
