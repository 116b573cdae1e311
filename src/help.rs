//! Read-only help rendering: a pure consumer of the finalized tree, reached
//! through the `help` flag's sink.

use std::fmt::Write;

use crate::tree::{Arg, Cmd};

macro_rules! w {
    ($($tt:tt)*) => {
        drop(write!($($tt)*))
    };
}

/// Renders the help text for a command and its subcommand tree.
pub fn render_help(cmd: &Cmd) -> String {
    let mut buf = String::new();
    help_rec(&mut buf, cmd, 0);
    buf
}

fn help_rec(buf: &mut String, cmd: &Cmd, level: usize) {
    let pad = "  ".repeat(level);
    w!(buf, "{pad}{}", cmd.name());
    if let Some(description) = cmd.description() {
        w!(buf, "    {description}");
    }
    w!(buf, "\n");

    // Arguments are listed for the entry command only; subcommands show up
    // as a one-line summary each.
    if level == 0 && cmd.count_arguments() > 0 {
        w!(buf, "{pad}  Arguments and flags:\n");
        for arg in cmd.args() {
            w!(buf, "{pad}  {}    {}\n", usage(arg), arg.ty());
        }
    }

    if cmd.count_subcommands() > 0 {
        w!(buf, "\n{pad}  Subcommands:\n");
        for sub in cmd.subcommands() {
            help_rec(buf, sub, level + 2);
        }
    }
}

fn usage(arg: &Arg) -> String {
    if arg.is_flag() {
        if arg.name().len() == 1 {
            return format!("-{}", arg.name());
        }
        return format!("--{}", arg.name().replace('_', "-"));
    }
    let dots = if arg.max_count() == Some(1) { "" } else { ".." };
    if arg.is_optional() {
        format!("[{}{dots}]", arg.name())
    } else {
        format!("<{}{dots}>", arg.name())
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;
    use crate::tree::Arg;
    use crate::value::Ty;

    #[test]
    fn renders_arguments_and_subcommands() {
        let mut cmd = Cmd::new("prog");
        cmd.set_description("Demo tool");

        let mut verbose = Arg::new("verbose", Ty::Bool);
        verbose.set_flag();
        verbose.set_optional();
        cmd.add_arg(verbose).unwrap();

        let mut path = Arg::new("path", Ty::Path);
        path.set_positional();
        cmd.add_arg(path).unwrap();

        let mut files = Arg::new("files", Ty::Str);
        files.set_positional();
        files.set_rest();
        files.set_optional();
        files.set_no_max_count();
        cmd.add_arg(files).unwrap();

        let mut build = Cmd::new("build");
        build.set_description("Compile things");
        cmd.add_subcommand(build).unwrap();

        expect![[r#"
            prog    Demo tool
              Arguments and flags:
              --verbose    bool
              <path>    path
              [files..]    str

              Subcommands:
                build    Compile things
        "#]]
        .assert_eq(&render_help(&cmd));
    }

    #[test]
    fn flag_names_are_shown_with_the_user_facing_separator() {
        let mut cmd = Cmd::new("prog");
        let mut log_file = Arg::new("log_file", Ty::Path);
        log_file.set_flag();
        log_file.set_optional();
        cmd.add_arg(log_file).unwrap();

        let help = render_help(&cmd);
        assert!(help.contains("--log-file"));
    }
}
