use crate::{constant, ChainBuilder, Compute};
use caseflow_base::{Result, Settings};
use test_log::test;

fn builder() -> ChainBuilder {
    ChainBuilder::new(&Settings::default())
}

fn message<T>(r: Result<T>) -> String {
    match r {
        Ok(_) => panic!("expected an error"),
        Err(e) => e.message().to_string(),
    }
}

#[test]
fn test_else_if_after_else() {
    let mut b = builder();
    b.do_if(constant(1.0));
    b.else_().unwrap();
    assert_eq!(message(b.else_if(constant(0.0))), "ELSE IF follows ELSE");
    assert_eq!(message(b.else_()), "ELSE follows ELSE");
    b.end_if().unwrap();
    assert_eq!(b.finish().unwrap().names(), vec!["DO IF"]);
}

#[test]
fn test_clause_without_do_if() {
    let mut b = builder();
    assert_eq!(message(b.else_()), "ELSE without DO IF");
    assert_eq!(message(b.end_if()), "END IF without DO IF");
    b.loop_(None, None);
    assert_eq!(message(b.else_if(constant(1.0))), "ELSE IF without DO IF");
    assert_eq!(message(b.end_if()), "END IF inside unclosed LOOP");
    // The failed END IF left the loop open.
    assert!(b.in_loop());
    b.end_loop(None).unwrap();
}

#[test]
fn test_unclosed_block() {
    let mut b = builder();
    b.loop_(None, None);
    b.do_if(constant(1.0));
    b.end_if().unwrap();
    assert_eq!(b.depth(), 1);
    assert_eq!(message(b.finish()), "LOOP is not closed");
}

#[test]
fn test_break_needs_loop() {
    let mut b = builder();
    assert_eq!(message(b.brk()), "BREAK is only allowed inside LOOP");
    b.loop_(None, None);
    b.do_if(constant(1.0));
    b.brk().unwrap();
    b.end_if().unwrap();
    b.end_loop(None).unwrap();
    assert!(!b.in_loop());
}

#[test]
fn test_input_program_commands() {
    let mut b = builder();
    assert_eq!(
        message(b.end_case()),
        "END CASE is only allowed inside INPUT PROGRAM"
    );
    assert_eq!(
        message(b.end_file()),
        "END FILE is only allowed inside INPUT PROGRAM"
    );
    assert_eq!(
        message(b.end_input_program()),
        "END INPUT PROGRAM without INPUT PROGRAM"
    );
    b.do_if(constant(1.0));
    assert_eq!(message(b.input_program()), "INPUT PROGRAM must not be nested");
}

#[test]
fn test_input_program_needs_an_end() {
    let mut b = builder();
    b.input_program().unwrap();
    assert!(b.in_input_program());
    b.add(Compute::new(0, constant(1.0)));
    b.end_case().unwrap();
    assert_eq!(
        message(b.end_input_program()),
        "input program contains neither a data source nor END FILE"
    );
}

#[test]
fn test_implicit_end_case() -> Result<()> {
    let mut b = builder();
    b.input_program()?;
    b.add(Compute::new(0, constant(1.0)));
    b.do_if(constant(1.0));
    b.end_file()?;
    b.end_if()?;
    let chain = b.end_input_program()?;
    assert_eq!(chain.names(), vec!["COMPUTE", "DO IF", "END CASE"]);
    assert!(b.finish()?.is_empty());
    Ok(())
}
