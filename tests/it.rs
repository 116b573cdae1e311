use cmdtree::{Arg, Cmd, Outcome, Program, Sink, Ty, Value};
use expect_test::{expect, Expect};

fn check(prog: &Program, args: &str, expect: Expect) {
    let argv: Vec<&str> = args.split_ascii_whitespace().collect();
    match prog.parse(&argv) {
        Ok(Outcome::Invoke(inv)) => expect.assert_debug_eq(&inv),
        Ok(Outcome::Help(text)) => expect.assert_eq(&text),
        Err(err) => expect.assert_eq(&err.to_string()),
    }
}

fn parse<'p>(prog: &'p Program, args: &str) -> Outcome<'p> {
    let argv: Vec<&str> = args.split_ascii_whitespace().collect();
    prog.parse(&argv).unwrap()
}

fn invoke<'p>(prog: &'p Program, args: &str) -> cmdtree::Invocation<'p> {
    match parse(prog, args) {
        Outcome::Invoke(inv) => inv,
        Outcome::Help(text) => panic!("unexpected help: {text}"),
    }
}

fn flag(name: &str, ty: Ty) -> Arg {
    let mut arg = Arg::new(name, ty);
    arg.set_flag();
    arg.set_optional();
    arg
}

fn positional(name: &str, ty: Ty) -> Arg {
    let mut arg = Arg::new(name, ty);
    arg.set_positional();
    arg
}

/// `prog` with subcommands `build` (required positional `path`, optional
/// integer flag `jobs` defaulting to 1) and `run` (boolean `verbose`).
fn demo_program() -> Program {
    let mut root = Cmd::new("prog");
    root.add_help_flag().unwrap();

    let mut build = Cmd::new("build");
    build.add_arg(positional("path", Ty::Path)).unwrap();
    let mut jobs = flag("jobs", Ty::Int);
    jobs.set_default(Value::Int(1));
    build.add_arg(jobs).unwrap();
    build.add_help_flag().unwrap();
    build.set_handler(Box::new(|positional, _keywords| positional.len() as i32));
    root.add_subcommand(build).unwrap();

    let mut run = Cmd::new("run");
    run.add_arg(flag("verbose", Ty::Bool)).unwrap();
    root.add_subcommand(run).unwrap();

    Program::new(root).unwrap()
}

#[test]
fn build_with_inline_flag_and_positional() {
    let prog = demo_program();
    check(
        &prog,
        "prog build --jobs=4 src",
        expect![[r#"
            Invocation {
                command: "build",
                positional: [
                    Path(
                        "src",
                    ),
                ],
                keywords: {
                    "jobs": Int(
                        4,
                    ),
                },
            }
        "#]],
    );

    let inv = invoke(&prog, "prog build --jobs=4 src");
    assert_eq!(inv.command().name(), "build");
    assert_eq!(inv.positional(), [Value::Path("src".into())]);
    assert_eq!(inv.keywords()["jobs"], Value::Int(4));
    assert_eq!(inv.run(), Some(1));
}

#[test]
fn root_help_short_circuits_before_subcommand_resolution() {
    let prog = demo_program();
    check(
        &prog,
        "prog --help",
        expect![[r#"
            prog
              Arguments and flags:
              --help    bool

              Subcommands:
                build
                run
        "#]],
    );
}

#[test]
fn subcommand_help_renders_its_own_tree() {
    let prog = demo_program();
    check(
        &prog,
        "prog build --help",
        expect![[r#"
            build
              Arguments and flags:
              <path>    path
              --jobs    int
              --help    bool
        "#]],
    );
}

#[test]
fn bare_boolean_flag_resolves_to_true() {
    let prog = demo_program();
    let inv = invoke(&prog, "prog run --verbose");
    assert_eq!(inv.command().name(), "run");
    assert_eq!(inv.keywords()["verbose"], Value::Bool(true));
}

#[test]
fn bare_flag_with_default_uses_it() {
    let prog = demo_program();
    let inv = invoke(&prog, "prog build src --jobs");
    assert_eq!(inv.keywords()["jobs"], Value::Int(1));
}

#[test]
fn subcommands_shadow_positional_values() {
    let mut root = Cmd::new("prog");
    root.add_arg(positional("name", Ty::Str)).unwrap();
    root.add_subcommand(Cmd::new("list")).unwrap();
    let prog = Program::new(root).unwrap();

    let inv = invoke(&prog, "prog list");
    assert_eq!(inv.command().name(), "list");
    assert!(inv.positional().is_empty());
}

#[test]
fn synthesized_complement_matches_explicit_off() {
    let mut root = Cmd::new("prog");
    root.add_arg(flag("enable_x", Ty::Bool)).unwrap();
    let prog = Program::new(root).unwrap();

    let by_complement = invoke(&prog, "prog --disable-x");
    let by_value = invoke(&prog, "prog --enable-x=off");
    assert_eq!(by_complement.keywords()["x"], Value::Bool(false));
    assert_eq!(by_complement.keywords(), by_value.keywords());
}

#[test]
fn disable_all_inverts_per_declared_polarity() {
    let mut root = Cmd::new("prog");
    root.add_arg(flag("enable_a", Ty::Bool)).unwrap();
    root.add_arg(flag("enable_b", Ty::Bool)).unwrap();
    root.add_arg(flag("disable_c", Ty::Bool)).unwrap();
    let prog = Program::new(root).unwrap();

    let inv = invoke(&prog, "prog --disable-all");
    assert_eq!(inv.keywords()["a"], Value::Bool(false));
    assert_eq!(inv.keywords()["b"], Value::Bool(false));
    assert_eq!(inv.keywords()["c"], Value::Bool(true));

    let inv = invoke(&prog, "prog --enable-all");
    assert_eq!(inv.keywords()["a"], Value::Bool(true));
    assert_eq!(inv.keywords()["b"], Value::Bool(true));
    assert_eq!(inv.keywords()["c"], Value::Bool(false));
}

#[test]
fn rest_flags_absorb_unmatched_flags() {
    let mut root = Cmd::new("prog");
    let mut extra = Arg::new("extra", Ty::Any);
    extra.set_flag();
    extra.set_rest();
    extra.set_optional();
    extra.set_sink(Sink::Gather);
    root.add_arg(extra).unwrap();
    let prog = Program::new(root).unwrap();

    let inv = invoke(&prog, "prog --retries=3 --label hot --dry-run");
    assert_eq!(inv.keywords()["retries"], Value::Int(3));
    assert_eq!(inv.keywords()["label"], Value::Str("hot".to_string()));
    assert_eq!(inv.keywords()["dry_run"], Value::Bool(true));
}

#[test]
fn rest_positionals_are_spliced_after_fixed_slots() {
    let mut root = Cmd::new("prog");
    root.add_arg(positional("first", Ty::Str)).unwrap();
    let mut rest = Arg::new("rest", Ty::Str);
    rest.set_positional();
    rest.set_rest();
    rest.set_optional();
    rest.set_no_max_count();
    rest.set_sink(Sink::Append);
    root.add_arg(rest).unwrap();
    let prog = Program::new(root).unwrap();

    let inv = invoke(&prog, "prog a b c");
    assert_eq!(
        inv.positional(),
        [
            Value::Str("a".to_string()),
            Value::Str("b".to_string()),
            Value::Str("c".to_string()),
        ]
    );
}

#[test]
fn error_messages() {
    let prog = demo_program();
    check(&prog, "prog --nope", expect!["unknown argument `--nope`"]);
    check(&prog, "prog build stray extra", expect!["unexpected argument `extra`"]);
    check(&prog, "prog build --jobs=many src", expect!["failed to parse `many` as int"]);

    let argv = ["prog", "--nope"];
    assert!(prog.parse(&argv).unwrap_err().is_usage());
}
