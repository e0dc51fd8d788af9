//! Built-in command-language grammar
//!
//! Covers the command families the session protocol speaks: assignment,
//! output, invocation, deletion, namespace switching, plus the expression
//! sublanguage with class-method invocations (`##class(Ns.Name).%Method()`),
//! intrinsic functions (`$piece(...)`), globals (`^name(...)`) and subscripted
//! locals.
//!
//! Whitespace is significant: it separates a command from its argument and one
//! command from the next, and never appears inside an expression. Loop
//! alternatives therefore start with their discriminating literal (`,` or an
//! operator), keeping the exit fallthrough reachable.

use super::chain::chain;
use super::table::MatchSpec;
use super::{Compiler, Grammar};
use crate::error::GrammarError;

/// Rule the parser starts from: a line of whitespace-separated commands
pub const START_RULE: &str = "line";

fn kw(value: &str) -> MatchSpec {
    MatchSpec::exact(value).class("keyword")
}

fn op(value: &str) -> MatchSpec {
    MatchSpec::exact(value).class("operator")
}

/// Compile the built-in grammar
///
/// Infallible in practice; the `Result` surfaces authoring mistakes during
/// development and tests.
pub fn grammar() -> Result<Grammar, GrammarError> {
    let mut compiler = Compiler::new();

    compiler.rule(
        "line",
        chain()
            .call("command")
            .branch()
            .split([
                chain().ws().call("command").merge(),
                chain().exit(),
            ])
            .exit(),
    )?;

    compiler.rule(
        "command",
        chain()
            .split([
                chain()
                    .id([kw("s"), kw("set")])
                    .ws()
                    .call("assignments")
                    .exit(),
                chain()
                    .id([kw("w"), kw("write"), kw("zw"), kw("zwrite")])
                    .split([chain().ws().call("arguments").exit(), chain().exit()])
                    .exit(),
                chain().id([kw("d"), kw("do")]).ws().call("docall").exit(),
                chain()
                    .id([kw("k"), kw("kill")])
                    .split([chain().ws().call("arguments").exit(), chain().exit()])
                    .exit(),
                chain()
                    .id([kw("r"), kw("read")])
                    .ws()
                    .id_any(MatchSpec::default().class("variable").semantic("variable"))
                    .exit(),
                chain()
                    .id([kw("zn"), kw("znspace")])
                    .ws()
                    .string(MatchSpec::default().class("string").semantic("namespace"))
                    .exit(),
                chain().id([kw("q"), kw("quit"), kw("h"), kw("halt")]).exit(),
            ])
            .exit(),
    )?;

    compiler.rule(
        "arguments",
        chain()
            .call("expression")
            .branch()
            .split([
                chain().char(",").call("expression").merge(),
                chain().exit(),
            ])
            .exit(),
    )?;

    compiler.rule(
        "assignments",
        chain()
            .call("assignment")
            .branch()
            .split([
                chain().char(",").call("assignment").merge(),
                chain().exit(),
            ])
            .exit(),
    )?;

    compiler.rule(
        "assignment",
        chain()
            .call("target")
            .char(op("="))
            .call("expression")
            .exit(),
    )?;

    // lvalues: subscripted local, global, plain local; the speculative
    // alternatives fall through to the plain one when no subscript follows
    compiler.rule(
        "target",
        chain()
            .split([
                chain().try_call("subscripted").exit(),
                chain().try_call("global").exit(),
                chain()
                    .id_any(MatchSpec::default().class("variable").semantic("variable"))
                    .exit(),
            ])
            .exit(),
    )?;

    compiler.rule(
        "docall",
        chain()
            .split([
                chain().try_call("classmethod").exit(),
                chain().try_call("global").exit(),
                chain().try_call("subscripted").exit(),
                chain()
                    .id_any(MatchSpec::default().class("variable").semantic("variable"))
                    .exit(),
            ])
            .exit(),
    )?;

    compiler.rule(
        "expression",
        chain()
            .call("term")
            .branch()
            .split([
                chain()
                    .char([
                        op("+"),
                        op("-"),
                        op("*"),
                        op("/"),
                        op("_"),
                        op("="),
                        op("<"),
                        op(">"),
                        op("#"),
                    ])
                    .call("term")
                    .merge(),
                chain().exit(),
            ])
            .exit(),
    )?;

    compiler.rule(
        "term",
        chain()
            .split([
                chain()
                    .constant(MatchSpec::default().class("number"))
                    .exit(),
                chain().string(MatchSpec::default().class("string")).exit(),
                chain().try_call("classmethod").exit(),
                chain().try_call("function").exit(),
                chain().try_call("subscripted").exit(),
                chain().try_call("global").exit(),
                chain().char([op("-"), op("+")]).call("term").exit(),
                chain().char("(").call("expression").char(")").exit(),
                chain()
                    .id_any(MatchSpec::default().class("variable").semantic("variable"))
                    .exit(),
            ])
            .exit(),
    )?;

    compiler.rule(
        "subscripted",
        chain()
            .id_any(MatchSpec::default().class("variable").semantic("variable"))
            .char("(")
            .call("arglist")
            .char(")")
            .exit(),
    )?;

    compiler.rule(
        "global",
        chain()
            .char(MatchSpec::exact("^").class("global"))
            .id_any(MatchSpec::default().class("global").semantic("global"))
            .split([
                chain().char("(").call("arglist").char(")").exit(),
                chain().exit(),
            ])
            .exit(),
    )?;

    compiler.rule(
        "function",
        chain()
            .char(MatchSpec::exact("$").class("function"))
            .id_any(MatchSpec::default().class("function").semantic("function"))
            .split([
                chain().char("(").call("arglist").char(")").exit(),
                chain().exit(),
            ])
            .exit(),
    )?;

    compiler.rule(
        "classmethod",
        chain()
            .char("#")
            .char("#")
            .id(MatchSpec::exact("class").class("keyword"))
            .char("(")
            .call("classname")
            .char(")")
            .char(".")
            .call("methodname")
            .char("(")
            .call("arglist")
            .char(")")
            .exit(),
    )?;

    compiler.rule(
        "classname",
        chain()
            .id_any(MatchSpec::default().class("class").semantic("class"))
            .branch()
            .split([
                chain()
                    .char(".")
                    .id_any(MatchSpec::default().class("class").semantic("class"))
                    .merge(),
                chain().exit(),
            ])
            .exit(),
    )?;

    // method names may carry the '%' system prefix
    compiler.rule(
        "methodname",
        chain()
            .split([
                chain()
                    .char(MatchSpec::exact("%").class("method"))
                    .id_any(MatchSpec::default().class("method").semantic("method"))
                    .exit(),
                chain()
                    .id_any(MatchSpec::default().class("method").semantic("method"))
                    .exit(),
            ])
            .exit(),
    )?;

    // possibly empty argument list; the speculative call backs out cleanly
    // when the parenthesis closes immediately
    compiler.rule(
        "arglist",
        chain()
            .split([chain().try_call("arguments").exit(), chain().exit()])
            .exit(),
    )?;

    compiler.finish()
}
