//! Library-level tests running the bundled programs through the evaluator.

use pyc::errors::EvalError;
use pyc::{emit_c, parse, run_module};
use pyc_runtime::{RefConvention, Runtime};

fn run(source: &str, convention: RefConvention) -> (Result<i32, EvalError>, String, Runtime) {
    let runtime = Runtime::with_convention(convention);
    let module = parse(source).expect("Failed to parse");
    let mut out = Vec::new();
    let result = run_module(&runtime, &module, &mut out);
    (result, String::from_utf8(out).expect("Output is not UTF-8"), runtime)
}

#[test]
fn test_bundled_programs_leave_no_live_values() {
    let programs = [
        include_str!("../lang-examples/arithmetic.py"),
        include_str!("../lang-examples/exit_code.py"),
        include_str!("../lang-examples/control_flow.py"),
        include_str!("../lang-examples/scoping.py"),
    ];

    for convention in [RefConvention::NewReference, RefConvention::Borrowed] {
        for source in programs {
            let (result, _, runtime) = run(source, convention);
            assert!(result.is_ok(), "{result:?}");
            assert_eq!(runtime.live_count(), 0, "leaked values under {convention:?}");
        }
    }
}

#[test]
fn test_failed_program_still_releases_values() {
    let (result, out, runtime) = run(
        include_str!("../lang-examples/type_error.py"),
        RefConvention::NewReference,
    );
    assert!(matches!(result, Err(EvalError::Helper(ref e)) if e.is_unsupported_operand()));
    assert_eq!(out, "before\n");
    assert_eq!(runtime.live_count(), 0);
}

#[test]
fn test_unbound_local_stops_the_program() {
    let (result, out, runtime) = run(
        include_str!("../lang-examples/unbound_local.py"),
        RefConvention::Borrowed,
    );
    assert!(matches!(result, Err(EvalError::UnboundLocal(ref name)) if name == "x"));
    assert_eq!(out, "start\n");
    assert_eq!(runtime.live_count(), 0);
}

#[test]
fn test_bundled_programs_translate_to_c() {
    for source in [
        include_str!("../lang-examples/arithmetic.py"),
        include_str!("../lang-examples/exit_code.py"),
        include_str!("../lang-examples/control_flow.py"),
        include_str!("../lang-examples/type_error.py"),
    ] {
        let module = parse(source).expect("Failed to parse");
        let program = emit_c(&module, RefConvention::NewReference).expect("Failed to emit C");
        assert!(program.contains("result = main_"));
    }

    for source in [
        include_str!("../lang-examples/scoping.py"),
        include_str!("../lang-examples/unbound_local.py"),
    ] {
        let module = parse(source).expect("Failed to parse");
        let program = emit_c(&module, RefConvention::NewReference).expect("Failed to emit C");
        assert!(program.contains("pyc_module_init();"));
    }
}
