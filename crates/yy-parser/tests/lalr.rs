//! LALR interpreter over a list grammar with an `error` production.
//!
//! ```text
//! 0  $accept : L $end
//! 1  L : L S
//! 2  L : S
//! 3  S : NUM ';'
//! 4  S : error ';'
//! ```

use yy_parser::{
    Error, LalrGrammar, LalrHost, LalrOptions, LalrParser, Symbol, TraceFlags, ERROR_SYMBOL,
};

const NUM: Symbol = 2;
const SEMI: Symbol = 3;
const LIST: Symbol = 4;
const STATEMENT: Symbol = 5;

const STATEMENTS: LalrGrammar<'static> = LalrGrammar {
    left_side: &[-1, 0, 0, 1, 1],
    rule_length: &[2, 2, 1, 2, 2],
    default_reductions: &[0, 0, 2, 0, 0, 1, 3, 4],
    shift_index: &[1, 1, 0, 4, 5, 0, 0, 0],
    reduce_index: &[0, 0, 0, 0, 0, 0, 0, 0],
    goto_index: &[0, 8],
    table: &[0, 0, 4, 3, 0, 0, 0, 6, 7, 5],
    check: &[-1, -1, 1, 2, -1, -1, -1, 3, 3, 1],
    default_goto: &[1, 2],
    table_size: 9,
    names: &["$end", "error", "NUM", "';'", "L", "S", "$undefined"],
    rules: &[
        "$accept : L $end",
        "L : L S",
        "L : S",
        "S : NUM ';'",
        "S : error ';'",
    ],
    final_state: 1,
    start: 0,
    max_token: 3,
    undefined_token: 6,
    error_symbol: ERROR_SYMBOL,
};

/// Sums the numbers of every well-formed statement.
struct Summer {
    input: std::vec::IntoIter<(Symbol, i64)>,
    reductions: Vec<(Symbol, usize)>,
    errors: usize,
    recover: bool,
}

impl Summer {
    fn new(input: &[(Symbol, i64)], recover: bool) -> Self {
        Self {
            input: input.to_vec().into_iter(),
            reductions: Vec::new(),
            errors: 0,
            recover,
        }
    }
}

impl LalrHost<i64> for Summer {
    fn next_token(&mut self) -> Result<Option<(Symbol, i64)>, Error> {
        Ok(self.input.next())
    }

    fn reduce(&mut self, symbol: Symbol, rule: usize, values: &[i64], out: &mut i64) -> Result<(), Error> {
        self.reductions.push((symbol, rule));
        *out = match rule {
            1 => values[0] + values[1],
            4 => 0,
            _ => values[0],
        };
        Ok(())
    }

    fn error(&mut self, err: Error) -> Result<(), Error> {
        self.errors += 1;
        if self.recover {
            Ok(())
        } else {
            Err(err)
        }
    }
}

fn num(value: i64) -> (Symbol, i64) {
    (NUM, value)
}

const SEMICOLON: (Symbol, i64) = (SEMI, 0);

#[test]
fn test_accepts_statement_list() {
    let input = [num(1), SEMICOLON, num(2), SEMICOLON];
    let mut parser = LalrParser::new(
        STATEMENTS,
        Summer::new(&input, false),
        LalrOptions::default().with_trace(TraceFlags::LALR),
    );
    parser.run().unwrap();

    assert_eq!(parser.error_count(), 0);
    assert_eq!(parser.value(), Some(&3));
    let host = parser.into_host();
    assert_eq!(host.errors, 0);
    assert_eq!(
        host.reductions,
        vec![(STATEMENT, 3), (LIST, 2), (STATEMENT, 3), (LIST, 1)]
    );
}

#[test]
fn test_recovers_through_error_production() {
    let input = [num(1), num(2), SEMICOLON, num(3), SEMICOLON];
    let mut parser = LalrParser::new(STATEMENTS, Summer::new(&input, true), LalrOptions::default());
    parser.run().unwrap();

    assert_eq!(parser.error_count(), 1);
    assert_eq!(parser.value(), Some(&3));
    let host = parser.into_host();
    assert_eq!(host.errors, 1);
    assert_eq!(
        host.reductions,
        vec![(STATEMENT, 4), (LIST, 2), (STATEMENT, 3), (LIST, 1)]
    );
}

#[test]
fn test_error_hook_can_stop_recovery() {
    let input = [num(1), num(2), SEMICOLON];
    let mut parser = LalrParser::new(STATEMENTS, Summer::new(&input, false), LalrOptions::default());
    assert!(matches!(parser.run(), Err(Error::ParseError)));
    assert_eq!(parser.error_count(), 1);
    assert!(parser.host().reductions.is_empty());
}

#[test]
fn test_recovery_fails_at_end_of_input() {
    let mut parser = LalrParser::new(STATEMENTS, Summer::new(&[num(1)], true), LalrOptions::default());
    assert!(matches!(parser.run(), Err(Error::ParseError)));
    // Reported once when the error was found, not again at the end.
    assert_eq!(parser.host().errors, 1);
}

#[test]
fn test_empty_input_is_rejected() {
    let mut parser = LalrParser::new(STATEMENTS, Summer::new(&[], false), LalrOptions::default());
    assert!(matches!(parser.run(), Err(Error::ParseError)));
    assert_eq!(parser.error_count(), 1);
}

#[test]
fn test_runs_are_repeatable() {
    let input = [num(4), SEMICOLON, num(5), SEMICOLON, num(6), SEMICOLON];
    let first = {
        let mut parser = LalrParser::new(STATEMENTS, Summer::new(&input, false), LalrOptions::default());
        parser.run().unwrap();
        (parser.value().copied(), parser.into_host().reductions)
    };
    let second = {
        let mut parser = LalrParser::new(STATEMENTS, Summer::new(&input, false), LalrOptions::default());
        parser.run().unwrap();
        (parser.value().copied(), parser.into_host().reductions)
    };
    assert_eq!(first, second);
    assert_eq!(first.0, Some(15));
}

#[test]
fn test_stack_ceiling() {
    let input = [num(1), SEMICOLON];
    let mut parser = LalrParser::new(
        STATEMENTS,
        Summer::new(&input, false),
        LalrOptions::default().with_max_stack(2),
    );
    assert!(matches!(parser.run(), Err(Error::TooManyItems { limit: 2 })));
    // Resource errors are not syntax errors; the hook sees them once at the end.
    assert_eq!(parser.error_count(), 0);
    assert_eq!(parser.host().errors, 1);
}

#[test]
fn test_long_input_with_small_initial_stack() {
    let input: Vec<_> = (1..=500).flat_map(|n| [num(n), SEMICOLON]).collect();
    let mut parser = LalrParser::new(
        STATEMENTS,
        Summer::new(&input, false),
        LalrOptions::default().with_initial_stack(1),
    );
    parser.run().unwrap();
    assert_eq!(parser.value(), Some(&125_250));
}
