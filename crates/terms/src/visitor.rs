use std::fmt;

use itertools::Itertools;

use crate::Term;
use crate::TermKind;
use crate::TermVar;

/// Dispatches on the variant of a term, with one method per variant. See
/// [Term::accept].
pub trait TermVisitor {
    type Output;

    fn visit_int(&mut self, term: &Term, value: i64) -> Self::Output;

    fn visit_real(&mut self, term: &Term, value: f64) -> Self::Output;

    fn visit_string(&mut self, term: &Term, value: &str) -> Self::Output;

    fn visit_appl(&mut self, term: &Term, op: &str, args: &[Term]) -> Self::Output;

    fn visit_nil(&mut self, term: &Term) -> Self::Output;

    fn visit_cons(&mut self, term: &Term, head: &Term, tail: &Term) -> Self::Output;

    fn visit_concat(&mut self, term: &Term, left: &Term, right: &Term) -> Self::Output;

    fn visit_none(&mut self, term: &Term) -> Self::Output;

    fn visit_some(&mut self, term: &Term, element: &Term) -> Self::Output;

    fn visit_var(&mut self, term: &Term, var: &TermVar) -> Self::Output;
}

impl Term {
    /// Calls the method of the visitor that corresponds to the variant of this term.
    pub fn accept<V: TermVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self.kind() {
            TermKind::Int(value) => visitor.visit_int(self, *value),
            TermKind::Real(value) => visitor.visit_real(self, *value),
            TermKind::String(value) => visitor.visit_string(self, value),
            TermKind::Appl { op, args } => visitor.visit_appl(self, op, args),
            TermKind::Nil => visitor.visit_nil(self),
            TermKind::Cons { head, tail } => visitor.visit_cons(self, head, tail),
            TermKind::Concat { left, right } => visitor.visit_concat(self, left, right),
            TermKind::None => visitor.visit_none(self),
            TermKind::Some(element) => visitor.visit_some(self, element),
            TermKind::Var(var) => visitor.visit_var(self, var),
        }
    }
}

/// Prints terms for diagnostics, e.g. `Foo(1, "a", [?X | ?XS], Some(1.0))`.
/// Attachments are not printed. The visit of a term prints its label and
/// schedules its subterms on `pending`, so nesting depth is not limited by
/// the call stack.
struct TermPrinter<'a, 'b> {
    f: &'a mut fmt::Formatter<'b>,
    pending: Vec<Pending>,
}

#[derive(Clone)]
enum Pending {
    Term(Term),
    Text(&'static str),
}

impl TermPrinter<'_, '_> {
    /// Schedules the terms with `separator` in between, followed by `close`.
    fn schedule(&mut self, terms: impl Iterator<Item = Term>, separator: &'static str, close: &'static str) {
        self.pending.push(Pending::Text(close));
        let items: Vec<Pending> = Itertools::intersperse(terms.map(Pending::Term), Pending::Text(separator)).collect();
        self.pending.extend(items.into_iter().rev());
    }
}

impl TermVisitor for TermPrinter<'_, '_> {
    type Output = fmt::Result;

    fn visit_int(&mut self, _term: &Term, value: i64) -> fmt::Result {
        write!(self.f, "{value}")
    }

    fn visit_real(&mut self, _term: &Term, value: f64) -> fmt::Result {
        write!(self.f, "{value:?}")
    }

    fn visit_string(&mut self, _term: &Term, value: &str) -> fmt::Result {
        write!(self.f, "{value:?}")
    }

    fn visit_appl(&mut self, _term: &Term, op: &str, args: &[Term]) -> fmt::Result {
        write!(self.f, "{op}(")?;
        self.schedule(args.iter().cloned(), ", ", ")");
        Ok(())
    }

    fn visit_nil(&mut self, _term: &Term) -> fmt::Result {
        write!(self.f, "[]")
    }

    fn visit_cons(&mut self, term: &Term, _head: &Term, _tail: &Term) -> fmt::Result {
        let (elements, tail) = term
            .list_elements()
            .expect("A cons is always a list");

        write!(self.f, "[")?;
        if matches!(tail.kind(), TermKind::Nil) {
            self.schedule(elements.into_iter(), ", ", "]");
        } else {
            self.pending.push(Pending::Text("]"));
            self.pending.push(Pending::Term(tail));
            self.schedule(elements.into_iter(), ", ", " | ");
        }
        Ok(())
    }

    fn visit_concat(&mut self, _term: &Term, left: &Term, right: &Term) -> fmt::Result {
        self.schedule([left.clone(), right.clone()].into_iter(), " ++ ", "");
        Ok(())
    }

    fn visit_none(&mut self, _term: &Term) -> fmt::Result {
        write!(self.f, "None()")
    }

    fn visit_some(&mut self, _term: &Term, element: &Term) -> fmt::Result {
        write!(self.f, "Some(")?;
        self.schedule([element.clone()].into_iter(), "", ")");
        Ok(())
    }

    fn visit_var(&mut self, _term: &Term, var: &TermVar) -> fmt::Result {
        write!(self.f, "{var}")
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printer = TermPrinter {
            f,
            pending: vec![Pending::Term(self.clone())],
        };

        while let Some(item) = printer.pending.pop() {
            match item {
                Pending::Term(term) => term.accept(&mut printer)?,
                Pending::Text(text) => printer.f.write_str(text)?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use crate::TermBuilder;
    use crate::appl;
    use crate::cons;
    use crate::int;
    use crate::list;
    use crate::nil;
    use crate::none;
    use crate::real;
    use crate::some;
    use crate::string;
    use crate::tuple;
    use crate::var;

    use super::*;

    /// Counts the number of variables and constructor applications.
    #[derive(Default)]
    struct Counter {
        variables: usize,
        applications: usize,
    }

    impl TermVisitor for Counter {
        type Output = ();

        fn visit_int(&mut self, _term: &Term, _value: i64) {}

        fn visit_real(&mut self, _term: &Term, _value: f64) {}

        fn visit_string(&mut self, _term: &Term, _value: &str) {}

        fn visit_appl(&mut self, _term: &Term, _op: &str, args: &[Term]) {
            self.applications += 1;
            for arg in args {
                arg.accept(self);
            }
        }

        fn visit_nil(&mut self, _term: &Term) {}

        fn visit_cons(&mut self, _term: &Term, head: &Term, tail: &Term) {
            head.accept(self);
            tail.accept(self);
        }

        fn visit_concat(&mut self, _term: &Term, left: &Term, right: &Term) {
            left.accept(self);
            right.accept(self);
        }

        fn visit_none(&mut self, _term: &Term) {}

        fn visit_some(&mut self, _term: &Term, element: &Term) {
            element.accept(self);
        }

        fn visit_var(&mut self, _term: &Term, _var: &TermVar) {
            self.variables += 1;
        }
    }

    #[test]
    fn test_visitor_dispatch() {
        let term = appl("Foo", [var("X"), list([appl("Bar", []), var("Y")]), some(var("X"))]);

        let mut counter = Counter::default();
        term.accept(&mut counter);

        assert_eq!(counter.variables, 3);
        assert_eq!(counter.applications, 2);
    }

    #[test_case(appl("Foo", [int(1), string("a")]), "Foo(1, \"a\")" ; "application")]
    #[test_case(tuple([real(1.0), none()]), "(1.0, None())" ; "tuple")]
    #[test_case(list([int(1), int(2)]), "[1, 2]" ; "closed list")]
    #[test_case(cons(var("X"), var("XS")).unwrap(), "[?X | ?XS]" ; "open list")]
    #[test_case(some(nil()), "Some([])" ; "option")]
    fn test_display(term: Term, expected: &str) {
        assert_eq!(term.to_string(), expected);
    }

    #[test]
    fn test_display_concatenation() {
        let term = TermBuilder::concat_lists(&var("XS"), &list([int(1)])).unwrap();
        assert_eq!(term.to_string(), "?XS ++ [1]");

        let term = TermBuilder::concat_lists(&cons(int(0), var("XS")).unwrap(), &list([some(int(1))])).unwrap();
        assert_eq!(term.to_string(), "[0 | ?XS] ++ [Some(1)]");
    }

    #[test]
    fn test_display_deeply_nested_term() {
        let depth = 200_000;
        let mut term = int(0);
        for _ in 0..depth {
            term = appl("f", [term]);
        }

        let text = term.to_string();
        assert_eq!(text.len(), 3 * depth + 1);
        assert!(text.starts_with("f(f(f("));
        assert!(text.ends_with("(0))))"));
    }
}
