mod common;
use common::*;

#[test]
fn exec_return_arithmetic_prints_and_terminates() {
    let (stdout, _, code) = compile_and_run("def main() {\n    return 1 + 2;\n    @(echo unreachable);\n}\n");
    assert_eq!(stdout, "3\n");
    assert_eq!(code, 0);
}

#[test]
fn exec_two_parameter_equality() {
    let src = r#"
def same(a, b) {
    return a == b;
}
yes = same(4, 4);
no = same(4, 5);
@(echo $yes $no);
"#;
    assert_eq!(run_ok(src), "1 0\n");
}

#[test]
fn exec_range_loop_counts_in_order() {
    let src = "for (i in 1 .. 3) {\n    @(echo $i);\n}\n";
    assert_eq!(run_ok(src), "1\n2\n3\n");
}

#[test]
fn exec_boolean_variable_condition_branches() {
    let src = r#"
on = true;
off = false;
if (on) { @(echo on-taken); } else { @(echo on-skipped); }
if (off) { @(echo off-taken); } else { @(echo off-skipped); }
"#;
    assert_eq!(run_ok(src), "on-taken\noff-skipped\n");
}

#[test]
fn exec_interpolated_string_keeps_segment_order() {
    let src = "name = \"world\";\ngreeting = \"hello $name!\";\n@(echo \"$greeting\");\n";
    assert_eq!(run_ok(src), "hello world!\n");
}

#[test]
fn exec_braced_interpolation_does_not_merge_names() {
    let src = "a = \"x\";\nab = \"wrong\";\ns = \"${a}b\";\n@(echo $s);\n";
    assert_eq!(run_ok(src), "xb\n");
}

#[test]
fn exec_equality_truth_table() {
    let src = r#"
a = 1 == 1;
b = 1 == 2;
c = 1 != 1;
d = 1 != 2;
e = "x" == "x";
f = "x" != "x";
@(echo $a $b $c $d $e $f);
"#;
    assert_eq!(run_ok(src), "1 0 0 1 1 0\n");
}

#[test]
fn exec_relational_values() {
    let src = r#"
a = 1 < 2;
b = 2 <= 1;
c = 3 > 2;
d = 2 >= 2;
@(echo $a $b $c $d);
"#;
    assert_eq!(run_ok(src), "1 0 1 1\n");
}

#[test]
fn exec_logical_truth_tables() {
    let src = r#"
t = true;
f = false;
a = t && t;
b = t && f;
c = f && t;
d = f && f;
e = t || f;
g = f || t;
h = f || f;
i = t || t;
@(echo $a $b $c $d $e $g $h $i);
"#;
    assert_eq!(run_ok(src), "1 0 0 0 1 1 0 1\n");
}

#[test]
fn exec_not_inverts() {
    let src = r#"
t = true;
a = !t;
b = !false;
c = !(1 == 2);
d = !(t && false);
@(echo $a $b $c $d);
"#;
    assert_eq!(run_ok(src), "0 1 1 1\n");
}

#[test]
fn exec_mixed_logical_with_comparisons() {
    let src = r#"
x = 5;
inside = x > 1 && x < 10;
outside = x < 1 || x > 10;
@(echo $inside $outside);
"#;
    assert_eq!(run_ok(src), "1 0\n");
}

#[test]
fn exec_elif_chain_picks_first_match() {
    let src = r#"
def classify(n) {
    if (n < 0) {
        return "negative";
    } else if (n == 0) {
        return "zero";
    } else {
        return "positive";
    }
}
a = classify(-3);
b = classify(0);
c = classify(7);
@(echo $a $b $c);
"#;
    assert_eq!(run_ok(src), "negative zero positive\n");
}

#[test]
fn exec_break_and_continue() {
    let src = r#"
for (i in 1 .. 10) {
    if (i == 2) {
        continue;
    }
    if (i == 5) {
        break;
    }
    @(echo $i);
}
"#;
    assert_eq!(run_ok(src), "1\n3\n4\n");
}

#[test]
fn exec_collection_loop_splits_words() {
    let src = "items = \"red green blue\";\nfor (c in items) {\n    @(echo item-$c);\n}\n";
    assert_eq!(run_ok(src), "item-red\nitem-green\nitem-blue\n");
}

#[test]
fn exec_loop_accumulates_into_global() {
    let src = r#"
total = 0;
for (i in 1 .. 4) {
    total = total + i;
}
@(echo $total);
"#;
    assert_eq!(run_ok(src), "10\n");
}

#[test]
fn exec_integer_arithmetic_truncates() {
    let src = "a = 7 / 2;\nb = 7 % 3;\nc = 2 * 3 - 1;\nd = -7 / 2;\n@(echo $a $b $c $d);\n";
    assert_eq!(run_ok(src), "3 1 5 -3\n");
}

#[test]
fn exec_pipe_captures_output() {
    let src = "n = @(printf 'a\\nb\\nc\\n') | @(wc -l);\n@(echo lines $n);\n";
    let out = run_ok(src);
    assert_eq!(out.split_whitespace().collect::<Vec<_>>(), ["lines", "3"]);
}

#[test]
fn exec_pipe_statement_streams() {
    let src = "@(echo hello) | @(tr a-z A-Z);\n";
    assert_eq!(run_ok(src), "HELLO\n");
}

#[test]
fn exec_nested_calls() {
    let src = r#"
def inc(x) {
    return x + 1;
}
def twice(x) {
    return inc(inc(x));
}
r = twice(40);
@(echo $r);
"#;
    assert_eq!(run_ok(src), "42\n");
}

#[test]
fn exec_function_returning_external_output() {
    let src = r#"
def words() {
    return @(echo one   two);
}
w = words();
@(echo "$w");
"#;
    assert_eq!(run_ok(src), "one two\n");
}

#[test]
fn exec_function_locals_do_not_leak() {
    let src = r#"
def f() {
    tmp = "inner";
    return tmp;
}
tmp2 = f();
@(echo "[$tmp2][${tmp:-unset}]");
"#;
    assert_eq!(run_ok(src), "[inner][unset]\n");
}

#[test]
fn exec_string_comparison_in_condition() {
    let src = r#"
mode = "fast";
if (mode == "slow") {
    @(echo slow);
} else if (mode == "fast") {
    @(echo fast);
}
"#;
    assert_eq!(run_ok(src), "fast\n");
}

#[test]
fn exec_library_defines_functions_only() {
    let bash = try_compile_with("def hello() { @(echo from-lib); }\n", true).unwrap();
    let (stdout, _, code) = run_bash_script(&bash, &[], &[]);
    assert_eq!(stdout, "");
    assert_eq!(code, 0);

    let sourced = format!("{}\nhello\n", bash);
    let (stdout, _, code) = run_bash_script(&sourced, &[], &[]);
    assert_eq!(stdout, "from-lib\n");
    assert_eq!(code, 0);
}

#[test]
fn exec_comparison_nested_in_condition() {
    let src = r#"
a = 1;
b = 2;
c = 1;
d = 5;
if ((a == c) == true) {
    @(echo first);
} else {
    @(echo not-first);
}
if (a > b) {
    @(echo wrong);
} else if ((a < b) == (c < d)) {
    @(echo second);
}
"#;
    assert_eq!(run_ok(src), "first\nsecond\n");
}

#[test]
fn exec_parameter_equality_on_strings() {
    let src = r#"
def same(a, b) {
    return a == b;
}
x = same("abc", "xyz");
y = same("abc", "abc");
@(echo $x $y);
"#;
    assert_eq!(run_ok(src), "0 1\n");
}

#[test]
fn exec_string_equality_in_logical_is_not_a_pattern() {
    let src = r#"
s = "abc";
p = "*";
t = true;
r = s == p && t;
@(echo $r);
"#;
    assert_eq!(run_ok(src), "0\n");
}

#[test]
fn exec_string_ordering_inclusive_operators() {
    let src = r#"
a = "abc" <= "abd";
b = "b" >= "c";
c = "b" <= "b";
@(echo $a $b $c);
"#;
    assert_eq!(run_ok(src), "1 0 1\n");
}

#[test]
fn exec_negating_a_negative_parameter() {
    let src = r#"
def neg(n) {
    return -n;
}
x = neg(-5);
y = neg(3);
@(echo $x $y);
"#;
    assert_eq!(run_ok(src), "5 -3\n");
}
