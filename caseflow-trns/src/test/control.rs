use super::{add_field, bool_expr, rec};
use crate::{
    constant, expr, field, Break, Chain, Clause, Compute, DoIf, IndexClause, Loop, Outcome,
    SelectIf, Transformation,
};
use caseflow_data::SYSMIS;
use test_log::test;

fn chain(entries: Vec<Box<dyn Transformation>>) -> Chain {
    let mut c = Chain::new();
    for e in entries {
        c.push(e);
    }
    c
}

fn set1(v: f64) -> Box<dyn Transformation> {
    Box::new(Compute::new(1, constant(v)))
}

fn if_else() -> DoIf {
    DoIf::new(vec![
        Clause {
            condition: Some(field(0)),
            body: chain(vec![set1(1.0)]),
        },
        Clause {
            condition: None,
            body: chain(vec![set1(2.0)]),
        },
    ])
}

#[test]
fn test_do_if_picks_clause() {
    let mut t = if_else();
    let mut r = rec(&[5.0, 0.0]);
    assert_eq!(t.execute(&mut r, 1), Outcome::Continue);
    assert_eq!(r.num(1), 1.0);

    let mut r = rec(&[0.0, 0.0]);
    assert_eq!(t.execute(&mut r, 1), Outcome::Continue);
    assert_eq!(r.num(1), 2.0);
}

#[test]
fn test_do_if_missing_condition_runs_nothing() {
    let mut t = if_else();
    let mut r = rec(&[SYSMIS, 0.0]);
    assert_eq!(t.execute(&mut r, 1), Outcome::Continue);
    assert_eq!(r.num(1), 0.0);
}

#[test]
fn test_do_if_passes_drop_up() {
    let mut t = DoIf::new(vec![Clause {
        condition: Some(constant(1.0)),
        body: chain(vec![Box::new(SelectIf::new(constant(0.0)))]),
    }]);
    let mut r = rec(&[0.0, 0.0]);
    assert_eq!(t.execute(&mut r, 1), Outcome::DropCase);
}

#[test]
fn test_index_loop() {
    // LOOP #i = 1 TO 5 BY 2. COMPUTE s = s + #i. END LOOP.
    let mut t = Loop::new(
        Some(IndexClause {
            field: 0,
            first: constant(1.0),
            last: constant(5.0),
            by: Some(constant(2.0)),
        }),
        None,
        None,
        chain(vec![Box::new(Compute::new(1, add_field(1, 0)))]),
        40,
    );
    let mut r = rec(&[0.0, 0.0]);
    assert_eq!(t.execute(&mut r, 1), Outcome::Continue);
    assert_eq!(r.num(1), 9.0);
    assert_eq!(r.num(0), 5.0);
}

#[test]
fn test_index_loop_ignores_mxloops() {
    let mut t = Loop::new(
        Some(IndexClause {
            field: 0,
            first: constant(1.0),
            last: constant(100.0),
            by: None,
        }),
        None,
        None,
        chain(vec![Box::new(Compute::new(1, add_field(1, 0)))]),
        3,
    );
    let mut r = rec(&[0.0, 0.0]);
    t.execute(&mut r, 1);
    assert_eq!(r.num(1), 5050.0);
}

#[test]
fn test_index_loop_that_never_runs() {
    let mut t = Loop::new(
        Some(IndexClause {
            field: 0,
            first: constant(5.0),
            last: constant(1.0),
            by: None,
        }),
        None,
        None,
        chain(vec![set1(99.0)]),
        40,
    );
    let mut r = rec(&[0.0, 0.0]);
    assert_eq!(t.execute(&mut r, 1), Outcome::Continue);
    // The index is still assigned its first value.
    assert_eq!(r.num(0), 5.0);
    assert_eq!(r.num(1), 0.0);
}

#[test]
fn test_zero_step_never_runs() {
    let mut t = Loop::new(
        Some(IndexClause {
            field: 0,
            first: constant(1.0),
            last: constant(3.0),
            by: Some(constant(0.0)),
        }),
        None,
        None,
        chain(vec![set1(99.0)]),
        40,
    );
    let mut r = rec(&[0.0, 0.0]);
    assert_eq!(t.execute(&mut r, 1), Outcome::Continue);
    assert_eq!(r.num(1), 0.0);
}

fn incr() -> Box<dyn Transformation> {
    Box::new(Compute::new(0, expr(|r, _| r.num(0) + 1.0)))
}

#[test]
fn test_mxloops_caps_plain_loop() {
    let mut t = Loop::new(None, None, None, chain(vec![incr()]), 40);
    let mut r = rec(&[0.0]);
    t.execute(&mut r, 1);
    assert_eq!(r.num(0), 40.0);
}

#[test]
fn test_loop_if_and_end_loop_if() {
    let mut t = Loop::new(
        None,
        Some(bool_expr(|x| x < 3.0)),
        None,
        chain(vec![incr()]),
        40,
    );
    let mut r = rec(&[0.0]);
    t.execute(&mut r, 1);
    assert_eq!(r.num(0), 3.0);

    let mut t = Loop::new(
        None,
        None,
        Some(bool_expr(|x| x >= 4.0)),
        chain(vec![incr()]),
        40,
    );
    let mut r = rec(&[0.0]);
    t.execute(&mut r, 1);
    assert_eq!(r.num(0), 4.0);
}

#[test]
fn test_break_inside_do_if_leaves_loop() {
    let brk = DoIf::new(vec![Clause {
        condition: Some(bool_expr(|x| x == 2.0)),
        body: chain(vec![Box::new(Break)]),
    }]);
    let mut t = Loop::new(None, None, None, chain(vec![incr(), Box::new(brk)]), 40);
    let mut r = rec(&[0.0]);
    assert_eq!(t.execute(&mut r, 1), Outcome::Continue);
    assert_eq!(r.num(0), 2.0);
}

#[test]
fn test_break_outside_loop_passes_up() {
    let mut t = DoIf::new(vec![Clause {
        condition: None,
        body: chain(vec![Box::new(Break), set1(99.0)]),
    }]);
    let mut r = rec(&[0.0, 0.0]);
    assert_eq!(t.execute(&mut r, 1), Outcome::Break);
    assert_eq!(r.num(1), 0.0);
}
