//! Small exercises that show the authoring surface. They double as fixtures
//! for the engine, runner and suite tests.

use anyhow::anyhow;
use indexmap::IndexMap;
use num_complex::Complex64;
use num_rational::Rational64;
use rand::Rng;

use rope_api_core::dtype::SetComparison;
use rope_api_core::{Equation, Expr, Value};
use rope_field_core::{fields, Problem};

use crate::callback::Signature;
use crate::exercise::{Exercise, Metadata, Weights};
use crate::outputs::{ScoreOutput, SolutionOutput};

fn sample(name: &str, exercise: Exercise) -> Exercise {
    exercise.with_source(format!("rope_exercise::samples::{name}"))
}

fn parse(text: &str) -> anyhow::Result<Expr> {
    Expr::parse(text).map_err(|err| anyhow!("{text}: {err}"))
}

pub fn fourty_two() -> Exercise {
    let exercise = Exercise::new("FourtyTwo", Signature::default(), |_| {
        Ok(Problem::new(
            "What is the answer to the Ultimate Question of Life, The Universe, \
             and Everything?\n\n<<answer>>",
        )
        .field("answer", fields::natural(true)))
    })
    .with_metadata(Metadata::titled("The Answer"))
    .with_the_solution(Signature::default(), |_| Ok(42i64));
    sample("FourtyTwo", exercise)
}

pub fn integer_division() -> Exercise {
    let exercise = Exercise::new("IntegerDivision", Signature::default(), |_| {
        Ok(Problem::new(
            "<<dividend>> divided by <<divisor>> is <<quotient>> with remainder <<remainder>>.",
        )
        .field("quotient", fields::natural(true))
        .field("remainder", fields::natural(true)))
    })
    .with_parameters(Signature::default(), |_, rng| {
        let dividend: i64 = rng.gen_range(2..=10);
        let divisor: i64 = rng.gen_range(1..=dividend);
        Ok(IndexMap::from([
            ("dividend".to_string(), Value::Int(dividend)),
            ("divisor".to_string(), Value::Int(divisor)),
        ]))
    })
    .with_the_solution(["dividend", "divisor"], |args| {
        let dividend = args.int("dividend")?;
        let divisor = args.int("divisor")?;
        Ok(SolutionOutput::fields([
            ("quotient", Value::Int(dividend / divisor)),
            ("remainder", Value::Int(dividend % divisor)),
        ]))
    });
    sample("IntegerDivision", exercise)
}

pub fn apples() -> Exercise {
    let exercise = Exercise::new("Apples", Signature::default(), |_| {
        Ok(Problem::new(
            "If there are five apples and you take away three, how many do you have?\n\n<<number>>",
        )
        .field("number", fields::natural(true)))
    })
    .with_the_solution(Signature::default(), |_| Ok(3i64))
    .with_feedback(["number"], |args| {
        Ok(if args.get("number").and_then(Value::as_int) == Some(3) {
            "Be honest: You knew the quiz, didn't you?"
        } else {
            "You took three apples, so you have three!"
        })
    });
    sample("Apples", exercise)
}

pub fn cinema_tickets() -> Exercise {
    let exercise = Exercise::new("CinemaTickets", Signature::default(), |_| {
        Ok(Problem::new(
            "One grandmother, two mothers, two daughters and one granddaughter go to the \
             cinema and buy one ticket each. How many tickets do they have to buy in \
             total?\n\n<<number>>",
        )
        .field("number", fields::natural(true)))
    })
    .with_the_solution(Signature::default(), |_| Ok(3i64))
    .with_feedback(["number"], |args| {
        Ok(if args.get("number").and_then(Value::as_int) == Some(3) {
            "Be honest: You knew the problem, didn't you?"
        } else {
            "The grandmother is also a mother and the mother is also a daughter."
        })
    });
    sample("CinemaTickets", exercise)
}

pub fn free_lunch() -> Exercise {
    let exercise = Exercise::new("FreeLunch", Signature::default(), |_| {
        Ok(Problem::new("Free lunch!"))
    })
    .with_scores(Signature::default(), |_| Ok(100.0));
    sample("FreeLunch", exercise)
}

pub fn factor() -> Exercise {
    let exercise = Exercise::new("Factor", Signature::default(), |_| {
        Ok(Problem::new("Give a factor of 42: <<answer>>")
            .field("answer", fields::int_range(Some(1), None)))
    })
    .with_a_solution(Signature::default(), |_| Ok(7i64))
    .with_scores(["answer"], |args| {
        let answer = args.int("answer")?;
        Ok(answer != 0 && 42 % answer == 0)
    });
    sample("Factor", exercise)
}

pub fn sum_equals_product() -> Exercise {
    let exercise = Exercise::new("SumEqualsProduct", Signature::default(), |_| {
        Ok(Problem::new(
            "Find a set of three different integers whose sum is equal to their product.\n\n<<numbers>>",
        )
        .field("numbers", fields::set(Some(3), SetComparison::Equality)))
    })
    .with_preamble(r"You know that $2 + 2 = 2 \times 2$.")
    .with_a_solution(Signature::default(), |_| {
        Ok(Value::set([1, 2, 3].map(Value::Int)))
    })
    .with_scores(["numbers"], |args| {
        let numbers = args
            .items("numbers")?
            .iter()
            .map(|n| n.as_int().ok_or_else(|| anyhow!("not an integer: {n}")))
            .collect::<anyhow::Result<Vec<i64>>>()?;
        let sum: i64 = numbers.iter().sum();
        let product = numbers.iter().try_fold(1i64, |acc, n| acc.checked_mul(*n));
        Ok(product == Some(sum))
    });
    sample("SumEqualsProduct", exercise)
}

/// The input field `root_` takes its solution from the parameter `root`.
pub fn square_root() -> Exercise {
    let exercise = Exercise::new("SquareRoot", ["root"], |args| {
        let root = args.int("root")?;
        Ok(Problem::new(format!("The square root of {} is <<root_>>.", root * root))
            .field("root_", fields::natural(true)))
    })
    .with_parameters(Signature::default(), |_, rng| {
        Ok(IndexMap::from([(
            "root".to_string(),
            Value::Int(rng.gen_range(1..=10)),
        )]))
    });
    sample("SquareRoot", exercise)
}

pub fn pythagorean_theorem() -> Exercise {
    let exercise = Exercise::new("PythagoreanTheorem", Signature::default(), |_| {
        Ok(Problem::new("The Pythagorean Theorem reads <<equation>>.")
            .field("equation", fields::equation("a,b,c")))
    })
    .with_the_solution(Signature::default(), |_| {
        Ok(Value::Equation(Equation::new(parse("a**2 + b**2")?, parse("c**2")?)))
    });
    sample("PythagoreanTheorem", exercise)
}

pub fn rational_example() -> Exercise {
    let exercise = Exercise::new("RationalExample", Signature::default(), |_| {
        Ok(Problem::new("A half is a third of it. What is it?\n\n<<number>>")
            .field("number", fields::rational()))
    })
    .with_the_solution(Signature::default(), |_| {
        Ok(Value::Rational(Rational64::new(3, 2)))
    });
    sample("RationalExample", exercise)
}

pub fn complex_example() -> Exercise {
    let exercise = Exercise::new("ComplexExample", Signature::default(), |_| {
        Ok(Problem::new("Square the number $1 + i$: <<z>>").field("z", fields::complex()))
    })
    .with_the_solution(Signature::default(), |_| {
        Ok(Value::Complex(Complex64::new(0.0, 2.0)))
    });
    sample("ComplexExample", exercise)
}

/// Scores the product per field and counts it twice.
pub fn multiplication_table() -> Exercise {
    let exercise = Exercise::new("MultiplicationTable", Signature::default(), |_| {
        Ok(Problem::new(r"<<a>> $\times$ <<b>> = <<c>>").field("c", fields::natural(true)))
    })
    .with_parameters(Signature::default(), |_, rng| {
        Ok(IndexMap::from([
            ("a".to_string(), Value::Int(rng.gen_range(1..=10))),
            ("b".to_string(), Value::Int(rng.gen_range(1..=10))),
        ]))
    })
    .with_weights(Weights::PerField(IndexMap::from([("c".to_string(), 2.0)])))
    .with_the_solution(["a", "b"], |args| Ok(args.int("a")? * args.int("b")?))
    .with_scores(["a", "b", "c"], |args| {
        let product = args.int("a")? * args.int("b")?;
        Ok(ScoreOutput::fields([("c", args.int("c")? == product)]))
    });
    sample("MultiplicationTable", exercise)
}

/// 10^21 is beyond 64 bit integers, so the answer is a real number.
pub fn sextillion() -> Exercise {
    let exercise = Exercise::new("Sextillion", Signature::default(), |_| {
        Ok(Problem::new("A 'Sextillion' equals <<answer>>.").field("answer", fields::real()))
    })
    .with_a_solution(Signature::default(), |_| Ok(Value::Real(1e21)));
    sample("Sextillion", exercise)
}

pub fn einstein() -> Exercise {
    let exercise = Exercise::new("Einstein", Signature::default(), |_| {
        Ok(Problem::new(
            "Einstein's most famous formula, relating Energy $E$ and mass $m$ via the \
             speed of light $c$, reads $E=$<<RHS>>.",
        )
        .field("RHS", fields::expression("m,c")))
    })
    .with_the_solution(Signature::default(), |_| Ok(Value::Expr(parse("m * c**2")?)));
    sample("Einstein", exercise)
}

/// Every sample exercise.
pub fn all() -> Vec<Exercise> {
    vec![
        apples(),
        cinema_tickets(),
        complex_example(),
        einstein(),
        factor(),
        fourty_two(),
        free_lunch(),
        integer_division(),
        multiplication_table(),
        pythagorean_theorem(),
        rational_example(),
        sextillion(),
        square_root(),
        sum_equals_product(),
    ]
}
