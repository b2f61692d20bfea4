//! Defines the registry and built-in implementations for XPath 1.0 functions.

use super::engine::EvaluationContext;
use crate::ast::FunctionName;
use crate::error::{EvalError, XPathError};
use crate::exslt;
use crate::namespaces::EXSLT_REGEXP_NAMESPACE;
use crate::value::{XPathValue, is_xml_whitespace, parse_number};
use arbor_tree::{Node, XML_NAMESPACE};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// The error type extension functions report. It is wrapped into
/// [`EvalError::ExtensionFailed`] together with the function name.
pub type ExtensionError = Box<dyn std::error::Error + Send + Sync>;

/// A caller-supplied function callable from expressions.
pub trait ExtensionFunction: Send + Sync {
    fn call<'t>(
        &self,
        context: &EvaluationContext<'t, '_>,
        args: Vec<XPathValue<'t>>,
    ) -> Result<XPathValue<'t>, ExtensionError>;
}

impl<F> ExtensionFunction for F
where
    F: for<'t, 'e> Fn(
            &EvaluationContext<'t, 'e>,
            Vec<XPathValue<'t>>,
        ) -> Result<XPathValue<'t>, ExtensionError>
        + Send
        + Sync,
{
    fn call<'t>(
        &self,
        context: &EvaluationContext<'t, '_>,
        args: Vec<XPathValue<'t>>,
    ) -> Result<XPathValue<'t>, ExtensionError> {
        self(context, args)
    }
}

/// Extension functions keyed by expanded name. Extensions take precedence
/// over core functions of the same name.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn ExtensionFunction>>,
}

fn expanded_name(namespace: Option<&str>, local: &str) -> String {
    match namespace {
        Some(uri) => format!("{{{}}}{}", uri, local),
        None => local.to_string(),
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, namespace: Option<&str>, local: &str, function: F)
    where
        F: for<'t, 'e> Fn(
                &EvaluationContext<'t, 'e>,
                Vec<XPathValue<'t>>,
            ) -> Result<XPathValue<'t>, ExtensionError>
            + Send
            + Sync
            + 'static,
    {
        self.register_arc(namespace, local, Arc::new(function));
    }

    pub fn register_arc(
        &mut self,
        namespace: Option<&str>,
        local: &str,
        function: Arc<dyn ExtensionFunction>,
    ) {
        let key = expanded_name(namespace, local);
        log::debug!("Registering extension function '{}'", key);
        self.functions.insert(key, function);
    }

    pub fn get(&self, namespace: Option<&str>, local: &str) -> Option<&Arc<dyn ExtensionFunction>> {
        self.functions.get(&expanded_name(namespace, local))
    }

    pub fn contains(&self, namespace: Option<&str>, local: &str) -> bool {
        self.get(namespace, local).is_some()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}

/// Dispatches a function call: registered extensions first, then the core
/// library for unprefixed names, then the EXSLT regular expression functions.
pub fn evaluate_function<'t>(
    name: &FunctionName,
    args: Vec<XPathValue<'t>>,
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<XPathValue<'t>, XPathError> {
    let namespace = match &name.prefix {
        Some(prefix) => Some(e_ctx.namespaces.resolve(prefix)?),
        None => None,
    };

    if let Some(extension) = e_ctx.functions.get(namespace, &name.local) {
        return extension.call(e_ctx, args).map_err(|err| {
            EvalError::ExtensionFailed {
                function: name.to_string(),
                message: err.to_string(),
            }
            .into()
        });
    }

    match namespace {
        None => evaluate_core_function(&name.local, args, e_ctx),
        Some(uri) if uri == EXSLT_REGEXP_NAMESPACE && e_ctx.options.use_regexp_extension => {
            exslt::evaluate_function(&name.local, args)
        }
        Some(uri) => Err(EvalError::UnknownFunction(expanded_name(Some(uri), &name.local)).into()),
    }
}

fn evaluate_core_function<'t>(
    name: &str,
    args: Vec<XPathValue<'t>>,
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<XPathValue<'t>, XPathError> {
    match name {
        // Node-Set
        "last" => func_last(args, e_ctx),
        "position" => func_position(args, e_ctx),
        "count" => func_count(args),
        "id" => func_id(args, e_ctx),
        "local-name" => func_local_name(args, e_ctx),
        "namespace-uri" => func_namespace_uri(args, e_ctx),
        "name" => func_name(args, e_ctx),

        // String
        "string" => func_string(args, e_ctx),
        "concat" => func_concat(args),
        "starts-with" => func_starts_with(args),
        "contains" => func_contains(args),
        "substring-before" => func_substring_before(args),
        "substring-after" => func_substring_after(args),
        "substring" => func_substring(args),
        "string-length" => func_string_length(args, e_ctx),
        "normalize-space" => func_normalize_space(args, e_ctx),
        "translate" => func_translate(args),

        // Boolean
        "boolean" => func_boolean(args),
        "not" => func_not(args),
        "true" => func_true(args),
        "false" => func_false(args),
        "lang" => func_lang(args, e_ctx),

        // Number
        "number" => func_number(args, e_ctx),
        "sum" => func_sum(args),
        "floor" => func_floor(args),
        "ceiling" => func_ceiling(args),
        "round" => func_round(args),

        _ => Err(EvalError::UnknownFunction(name.to_string()).into()),
    }
}

pub(crate) fn check_arity(
    function: &str,
    args: &[XPathValue<'_>],
    min: usize,
    max: usize,
) -> Result<(), XPathError> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let expected = if min == max {
        format!("{}", min)
    } else if max == usize::MAX {
        format!("at least {}", min)
    } else {
        format!("{} or {}", min, max)
    };
    Err(EvalError::function(
        function,
        format!("Expected {} arguments, got {}", expected, args.len()),
    )
    .into())
}

fn node_set_arg<'t>(function: &str, value: XPathValue<'t>) -> Result<Vec<Node<'t>>, XPathError> {
    match value {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        v => Err(EvalError::TypeError(format!(
            "{}() argument must be a node-set, got {}",
            function,
            v.type_name()
        ))
        .into()),
    }
}

/// The node a name function inspects: the context node without an
/// argument, otherwise the first node of the argument in document order.
fn optional_node_arg<'t>(
    function: &str,
    mut args: Vec<XPathValue<'t>>,
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<Option<Node<'t>>, XPathError> {
    check_arity(function, &args, 0, 1)?;
    if args.is_empty() {
        return Ok(Some(e_ctx.context_node));
    }
    let nodes = node_set_arg(function, args.remove(0))?;
    Ok(nodes.into_iter().min())
}

fn string_or_context<'t>(
    mut args: Vec<XPathValue<'t>>,
    e_ctx: &EvaluationContext<'t, '_>,
) -> String {
    if args.is_empty() {
        e_ctx.context_node.string_value()
    } else {
        args.remove(0).to_string()
    }
}

/// Pops the two string arguments of a binary string function.
fn two_strings(
    function: &str,
    mut args: Vec<XPathValue<'_>>,
) -> Result<(String, String), XPathError> {
    check_arity(function, &args, 2, 2)?;
    let s2 = args.remove(1).to_string();
    let s1 = args.remove(0).to_string();
    Ok((s1, s2))
}

/// XPath `round()`: halves go towards positive infinity, and values in
/// `[-0.5, 0)` round to negative zero.
pub(crate) fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() || n == 0.0 {
        n
    } else if (-0.5..0.0).contains(&n) {
        -0.0
    } else {
        let floor = n.floor();
        if n - floor >= 0.5 {
            floor + 1.0
        } else {
            floor
        }
    }
}

// --- Node-Set Functions ---

fn func_last<'t>(
    args: Vec<XPathValue<'t>>,
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<XPathValue<'t>, XPathError> {
    check_arity("last", &args, 0, 0)?;
    Ok(XPathValue::Number(e_ctx.context_size as f64))
}

fn func_position<'t>(
    args: Vec<XPathValue<'t>>,
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<XPathValue<'t>, XPathError> {
    check_arity("position", &args, 0, 0)?;
    Ok(XPathValue::Number(e_ctx.context_position as f64))
}

fn func_count(mut args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    check_arity("count", &args, 1, 1)?;
    let nodes = node_set_arg("count", args.remove(0))?;
    Ok(XPathValue::Number(nodes.len() as f64))
}

fn func_id<'t>(
    mut args: Vec<XPathValue<'t>>,
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<XPathValue<'t>, XPathError> {
    check_arity("id", &args, 1, 1)?;
    let id_string = match args.remove(0) {
        XPathValue::NodeSet(nodes) => nodes
            .iter()
            .map(|n| n.string_value())
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    };
    let ids_to_find: HashSet<&str> = id_string
        .split(is_xml_whitespace)
        .filter(|s| !s.is_empty())
        .collect();
    if ids_to_find.is_empty() {
        return Ok(XPathValue::NodeSet(vec![]));
    }

    let results = e_ctx
        .root_node()
        .descendants()
        .filter(|node| node.is_element())
        .filter(|node| {
            node.attribute(None, "id")
                .into_iter()
                .chain(node.attribute(Some(XML_NAMESPACE), "id"))
                .any(|value| ids_to_find.contains(value))
        })
        .collect();
    Ok(XPathValue::NodeSet(results))
}

fn func_local_name<'t>(
    args: Vec<XPathValue<'t>>,
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<XPathValue<'t>, XPathError> {
    let node = optional_node_arg("local-name", args, e_ctx)?;
    let name = node
        .and_then(|n| n.local_name())
        .unwrap_or_default()
        .to_string();
    Ok(XPathValue::String(name))
}

fn func_namespace_uri<'t>(
    args: Vec<XPathValue<'t>>,
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<XPathValue<'t>, XPathError> {
    let node = optional_node_arg("namespace-uri", args, e_ctx)?;
    let uri = node
        .and_then(|n| n.namespace_uri())
        .unwrap_or_default()
        .to_string();
    Ok(XPathValue::String(uri))
}

fn func_name<'t>(
    args: Vec<XPathValue<'t>>,
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<XPathValue<'t>, XPathError> {
    let node = optional_node_arg("name", args, e_ctx)?;
    let name = node.map(|n| n.qualified_name()).unwrap_or_default();
    Ok(XPathValue::String(name))
}

// --- String Functions ---

fn func_string<'t>(
    args: Vec<XPathValue<'t>>,
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<XPathValue<'t>, XPathError> {
    check_arity("string", &args, 0, 1)?;
    Ok(XPathValue::String(string_or_context(args, e_ctx)))
}

fn func_concat(args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    check_arity("concat", &args, 2, usize::MAX)?;
    let result = args.iter().map(|v| v.to_string()).collect::<String>();
    Ok(XPathValue::String(result))
}

fn func_starts_with(args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    let (s1, s2) = two_strings("starts-with", args)?;
    Ok(XPathValue::Boolean(s1.starts_with(&s2)))
}

fn func_contains(args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    let (s1, s2) = two_strings("contains", args)?;
    Ok(XPathValue::Boolean(s1.contains(&s2)))
}

fn func_substring_before(args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    let (s1, s2) = two_strings("substring-before", args)?;
    let before = s1.find(&s2).map(|index| &s1[..index]).unwrap_or_default();
    Ok(XPathValue::String(before.to_string()))
}

fn func_substring_after(args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    let (s1, s2) = two_strings("substring-after", args)?;
    let after = s1
        .find(&s2)
        .map(|index| &s1[index + s2.len()..])
        .unwrap_or_default();
    Ok(XPathValue::String(after.to_string()))
}

fn func_substring(mut args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    check_arity("substring", &args, 2, 3)?;
    let length_val = if args.len() == 3 {
        Some(args.remove(2).to_number())
    } else {
        None
    };
    let start_val = args.remove(1).to_number();
    let s = args.remove(0).to_string();

    let first = xpath_round(start_val);
    let last = match length_val {
        Some(l) => first + xpath_round(l),
        None => f64::INFINITY,
    };

    // NaN bounds make every comparison false, which selects nothing.
    let result = s
        .chars()
        .enumerate()
        .filter_map(|(i, c)| {
            let pos = (i + 1) as f64;
            (pos >= first && pos < last).then_some(c)
        })
        .collect::<String>();
    Ok(XPathValue::String(result))
}

fn func_string_length<'t>(
    args: Vec<XPathValue<'t>>,
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<XPathValue<'t>, XPathError> {
    check_arity("string-length", &args, 0, 1)?;
    let s = string_or_context(args, e_ctx);
    Ok(XPathValue::Number(s.chars().count() as f64))
}

fn func_normalize_space<'t>(
    args: Vec<XPathValue<'t>>,
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<XPathValue<'t>, XPathError> {
    check_arity("normalize-space", &args, 0, 1)?;
    let s = string_or_context(args, e_ctx);
    let normalized = s
        .split(is_xml_whitespace)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Ok(XPathValue::String(normalized))
}

fn func_translate(mut args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    check_arity("translate", &args, 3, 3)?;
    let to_str: Vec<char> = args.remove(2).to_string().chars().collect();
    let from_str: Vec<char> = args.remove(1).to_string().chars().collect();
    let source_str = args.remove(0).to_string();
    // Only the first occurrence of a character in `from` counts.
    let result = source_str
        .chars()
        .filter_map(|c| match from_str.iter().position(|&fc| fc == c) {
            Some(pos) => to_str.get(pos).copied(),
            None => Some(c),
        })
        .collect::<String>();
    Ok(XPathValue::String(result))
}

// --- Boolean Functions ---

fn func_boolean(mut args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    check_arity("boolean", &args, 1, 1)?;
    Ok(XPathValue::Boolean(args.remove(0).to_bool()))
}

fn func_not(mut args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    check_arity("not", &args, 1, 1)?;
    Ok(XPathValue::Boolean(!args.remove(0).to_bool()))
}

fn func_true(args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    check_arity("true", &args, 0, 0)?;
    Ok(XPathValue::Boolean(true))
}

fn func_false(args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    check_arity("false", &args, 0, 0)?;
    Ok(XPathValue::Boolean(false))
}

fn func_lang<'t>(
    mut args: Vec<XPathValue<'t>>,
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<XPathValue<'t>, XPathError> {
    check_arity("lang", &args, 1, 1)?;
    let test_lang = args.remove(0).to_string().to_lowercase();
    let matches = e_ctx.context_node.language().is_some_and(|lang| {
        let node_lang = lang.to_lowercase();
        // "en" matches "en" and "en-GB".
        node_lang == test_lang
            || node_lang
                .strip_prefix(test_lang.as_str())
                .is_some_and(|rest| rest.starts_with('-'))
    });
    Ok(XPathValue::Boolean(matches))
}

// --- Number Functions ---

fn func_number<'t>(
    args: Vec<XPathValue<'t>>,
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<XPathValue<'t>, XPathError> {
    check_arity("number", &args, 0, 1)?;
    let n = match args.into_iter().next() {
        Some(value) => value.to_number(),
        None => parse_number(&e_ctx.context_node.string_value()),
    };
    Ok(XPathValue::Number(n))
}

fn func_sum(mut args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    check_arity("sum", &args, 1, 1)?;
    let sum = node_set_arg("sum", args.remove(0))?
        .iter()
        .map(|node| parse_number(&node.string_value()))
        .sum();
    Ok(XPathValue::Number(sum))
}

fn func_floor(mut args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    check_arity("floor", &args, 1, 1)?;
    Ok(XPathValue::Number(args.remove(0).to_number().floor()))
}

fn func_ceiling(mut args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    check_arity("ceiling", &args, 1, 1)?;
    Ok(XPathValue::Number(args.remove(0).to_number().ceil()))
}

fn func_round(mut args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    check_arity("round", &args, 1, 1)?;
    Ok(XPathValue::Number(xpath_round(args.remove(0).to_number())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::{NamespaceMap, NamespaceResolver};
    use crate::options::XPathOptions;
    use crate::variables::Variables;
    use arbor_tree::{Tree, xml};

    // --- Test Setup ---

    const DOC: &str = r#"<doc xml:lang="en-GB"><para id="p1">Hello</para><!--c--><div xml:lang="fr"><para xml:id="p2">  Inner   text </para></div><n>1</n><n>2.5</n><n>x</n></doc>"#;

    // Holds the evaluation environment so contexts can borrow from it.
    struct TestSetup<'t> {
        tree: &'t Tree,
        funcs: FunctionRegistry,
        vars: Variables<'t>,
        namespaces: NamespaceMap,
        options: XPathOptions,
    }

    impl<'t> TestSetup<'t> {
        fn new(tree: &'t Tree) -> Self {
            TestSetup {
                tree,
                funcs: FunctionRegistry::default(),
                vars: Variables::new(),
                namespaces: NamespaceMap::new(),
                options: XPathOptions::default(),
            }
        }

        fn context<'s>(
            &'s self,
            node: Node<'t>,
            pos: usize,
            size: usize,
        ) -> EvaluationContext<'t, 's> {
            EvaluationContext::new(
                node,
                &self.vars,
                &self.funcs,
                NamespaceResolver::new(&self.namespaces, self.options.use_regexp_extension),
                &self.options,
            )
            .with_focus(node, pos, size)
        }

        fn root_context<'s>(&'s self) -> EvaluationContext<'t, 's> {
            self.context(self.tree.root(), 1, 1)
        }

        fn element(&self, name: &str) -> Node<'t> {
            self.tree
                .root()
                .descendants()
                .find(|n| n.is_element() && n.local_name() == Some(name))
                .unwrap()
        }
    }

    fn try_eval_func<'t>(
        name: &str,
        args: Vec<XPathValue<'t>>,
        e_ctx: &EvaluationContext<'t, '_>,
    ) -> Result<XPathValue<'t>, XPathError> {
        let name = match name.split_once(':') {
            Some((prefix, local)) => FunctionName::new(Some(prefix), local),
            None => FunctionName::new(None, name),
        };
        evaluate_function(&name, args, e_ctx)
    }

    fn eval_func<'t>(
        name: &str,
        args: Vec<XPathValue<'t>>,
        e_ctx: &EvaluationContext<'t, '_>,
    ) -> XPathValue<'t> {
        try_eval_func(name, args, e_ctx).unwrap()
    }

    fn s(text: &str) -> XPathValue<'static> {
        XPathValue::String(text.to_string())
    }

    // --- String Function Tests ---

    #[test]
    fn test_func_concat() {
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.root_context();
        let args = vec![s("Hello"), s(" "), s("World"), XPathValue::Number(42.0)];
        assert_eq!(eval_func("concat", args, &e_ctx).to_string(), "Hello World42");

        let err = try_eval_func("concat", vec![s("a")], &e_ctx).unwrap_err();
        assert!(matches!(err, XPathError::Eval(EvalError::FunctionError { .. })));
    }

    #[test]
    fn test_func_substring_family() {
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.root_context();

        let sub = |args| eval_func("substring", args, &e_ctx).to_string();
        assert_eq!(sub(vec![s("12345"), 2.0.into(), 3.0.into()]), "234");
        assert_eq!(sub(vec![s("12345"), 2.0.into()]), "2345");
        assert_eq!(sub(vec![s("12345"), 1.5.into(), 2.6.into()]), "234");
        assert_eq!(sub(vec![s("12345"), 0.0.into(), 3.0.into()]), "12");
        assert_eq!(sub(vec![s("12345"), f64::NAN.into(), 3.0.into()]), "");
        assert_eq!(sub(vec![s("12345"), (-42.0).into(), f64::INFINITY.into()]), "12345");
        assert_eq!(
            sub(vec![s("12345"), f64::NEG_INFINITY.into(), f64::INFINITY.into()]),
            ""
        );

        let before = eval_func("substring-before", vec![s("1999/04/01"), s("/")], &e_ctx);
        assert_eq!(before.to_string(), "1999");
        let after = eval_func("substring-after", vec![s("1999/04/01"), s("/")], &e_ctx);
        assert_eq!(after.to_string(), "04/01");
        let missing = eval_func("substring-after", vec![s("abc"), s("z")], &e_ctx);
        assert_eq!(missing.to_string(), "");
    }

    #[test]
    fn test_func_string_length_and_normalize_space() {
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new(&tree);
        let para = setup.element("para");
        let e_ctx_para = setup.context(para, 1, 1);

        assert_eq!(eval_func("string-length", vec![], &e_ctx_para).to_number(), 5.0);
        assert_eq!(
            eval_func("string-length", vec![s("añb")], &e_ctx_para).to_number(),
            3.0
        );

        let args = vec![s("  leading \n and   \t trailing  ")];
        assert_eq!(
            eval_func("normalize-space", args, &e_ctx_para).to_string(),
            "leading and trailing"
        );
        // Non-breaking spaces are not XML whitespace.
        let args = vec![s("a\u{a0} b")];
        assert_eq!(
            eval_func("normalize-space", args, &e_ctx_para).to_string(),
            "a\u{a0} b"
        );
    }

    #[test]
    fn test_func_translate() {
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.root_context();
        let args = vec![s("BAR"), s("ABC"), s("abc")];
        assert_eq!(eval_func("translate", args, &e_ctx).to_string(), "baR");

        let args2 = vec![s("--aaa--"), s("abc-"), s("ABC")];
        assert_eq!(eval_func("translate", args2, &e_ctx).to_string(), "AAA");
    }

    // --- Boolean Function Tests ---

    #[test]
    fn test_func_boolean_and_not() {
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.root_context();
        assert!(!eval_func("not", vec![XPathValue::Boolean(true)], &e_ctx).to_bool());
        assert!(eval_func("not", vec![XPathValue::Number(0.0)], &e_ctx).to_bool());
        assert!(eval_func("not", vec![s("")], &e_ctx).to_bool());
        assert!(!eval_func("boolean", vec![XPathValue::Number(f64::NAN)], &e_ctx).to_bool());
        assert!(eval_func("boolean", vec![s("false")], &e_ctx).to_bool());
        assert!(eval_func("true", vec![], &e_ctx).to_bool());
        assert!(!eval_func("false", vec![], &e_ctx).to_bool());
    }

    #[test]
    fn test_func_lang() {
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new(&tree);
        let hello = setup.element("para").first_child().unwrap();
        let e_ctx_text = setup.context(hello, 1, 1);
        let e_ctx_div = setup.context(setup.element("div"), 1, 1);

        assert!(eval_func("lang", vec![s("en")], &e_ctx_text).to_bool());
        assert!(eval_func("lang", vec![s("EN-gb")], &e_ctx_text).to_bool());
        assert!(!eval_func("lang", vec![s("e")], &e_ctx_text).to_bool());
        assert!(!eval_func("lang", vec![s("en")], &e_ctx_div).to_bool());
        assert!(eval_func("lang", vec![s("fr")], &e_ctx_div).to_bool());
    }

    // --- Number Function Tests ---

    #[test]
    fn test_func_number_and_sum() {
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.root_context();
        let numbers: Vec<Node<'_>> = tree
            .root()
            .descendants()
            .filter(|n| n.local_name() == Some("n"))
            .collect();

        let sum_numeric = eval_func("sum", vec![numbers[..2].to_vec().into()], &e_ctx);
        assert_eq!(sum_numeric.to_number(), 3.5);
        let sum_all = eval_func("sum", vec![numbers.clone().into()], &e_ctx);
        assert!(sum_all.to_number().is_nan());
        let err = try_eval_func("sum", vec![s("1")], &e_ctx).unwrap_err();
        assert!(matches!(err, XPathError::Eval(EvalError::TypeError(_))));

        assert!(eval_func("number", vec![s("abc")], &e_ctx).to_number().is_nan());
        assert!(eval_func("number", vec![s("1e3")], &e_ctx).to_number().is_nan());
        assert_eq!(eval_func("number", vec![s(" -4.5 ")], &e_ctx).to_number(), -4.5);
        let e_ctx_n = setup.context(numbers[1], 1, 1);
        assert_eq!(eval_func("number", vec![], &e_ctx_n).to_number(), 2.5);
    }

    #[test]
    fn test_func_round() {
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.root_context();
        let round = |n: f64| eval_func("round", vec![n.into()], &e_ctx).to_number();
        assert_eq!(round(2.5), 3.0);
        assert_eq!(round(2.4), 2.0);
        assert_eq!(round(-2.5), -2.0);
        assert_eq!(round(-2.6), -3.0);
        assert!(round(-0.3).is_sign_negative());
        assert!(round(f64::NAN).is_nan());
        assert_eq!(round(f64::INFINITY), f64::INFINITY);
        assert_eq!(round(0.49999999999999994), 0.0);
        assert_eq!(round(4503599627370497.0), 4503599627370497.0);
        assert_eq!(round(-4503599627370497.0), -4503599627370497.0);

        assert_eq!(eval_func("floor", vec![(-1.5).into()], &e_ctx).to_number(), -2.0);
        assert_eq!(eval_func("ceiling", vec![1.2.into()], &e_ctx).to_number(), 2.0);
    }

    // --- Node-Set Function Tests ---

    #[test]
    fn test_func_last_and_position() {
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new(&tree);
        // The 2nd node in a context of 5 nodes.
        let e_ctx = setup.context(setup.element("para"), 2, 5);
        assert_eq!(eval_func("last", vec![], &e_ctx).to_number(), 5.0);
        assert_eq!(eval_func("position", vec![], &e_ctx).to_number(), 2.0);
        assert!(try_eval_func("last", vec![s("x")], &e_ctx).is_err());
    }

    #[test]
    fn test_func_names() {
        let tree = xml::parse(r#"<p:a xmlns:p="urn:p" p:x="1"><b/>text</p:a>"#).unwrap();
        let setup = TestSetup::new(&tree);
        let a = tree.document_element().unwrap();
        let e_ctx = setup.context(a, 1, 1);

        assert_eq!(eval_func("local-name", vec![], &e_ctx).to_string(), "a");
        assert_eq!(eval_func("name", vec![], &e_ctx).to_string(), "p:a");
        assert_eq!(eval_func("namespace-uri", vec![], &e_ctx).to_string(), "urn:p");

        let attr = a.attributes().next().unwrap();
        assert_eq!(eval_func("name", vec![attr.into()], &e_ctx).to_string(), "p:x");

        let b = a.first_child().unwrap();
        assert_eq!(eval_func("namespace-uri", vec![b.into()], &e_ctx).to_string(), "");

        let text = a.last_child().unwrap();
        assert_eq!(eval_func("local-name", vec![text.into()], &e_ctx).to_string(), "");
        let empty = XPathValue::NodeSet(vec![]);
        assert_eq!(eval_func("name", vec![empty], &e_ctx).to_string(), "");

        let err = try_eval_func("name", vec![s("a")], &e_ctx).unwrap_err();
        assert!(matches!(err, XPathError::Eval(EvalError::TypeError(_))));
    }

    #[test]
    fn test_func_id_and_count() {
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.root_context();

        let found = eval_func("id", vec![s(" p2\tp1 missing ")], &e_ctx);
        match &found {
            XPathValue::NodeSet(nodes) => {
                assert_eq!(nodes.len(), 2);
                assert!(nodes[0] < nodes[1]);
            }
            other => panic!("Expected NodeSet, got {other:?}"),
        }
        assert_eq!(eval_func("count", vec![found], &e_ctx).to_number(), 2.0);

        let err = try_eval_func("count", vec![s("p1")], &e_ctx).unwrap_err();
        assert!(matches!(err, XPathError::Eval(EvalError::TypeError(_))));
    }

    // --- Dispatch Tests ---

    #[test]
    fn test_unknown_functions() {
        let tree = xml::parse(DOC).unwrap();
        let mut setup = TestSetup::new(&tree);
        setup.namespaces.insert("ex", "urn:ex").unwrap();
        let e_ctx = setup.root_context();

        let err = try_eval_func("frobnicate", vec![], &e_ctx).unwrap_err();
        assert_eq!(err, XPathError::Eval(EvalError::UnknownFunction("frobnicate".into())));

        let err = try_eval_func("ex:frobnicate", vec![], &e_ctx).unwrap_err();
        assert_eq!(
            err,
            XPathError::Eval(EvalError::UnknownFunction("{urn:ex}frobnicate".into()))
        );

        let err = try_eval_func("nope:f", vec![], &e_ctx).unwrap_err();
        assert_eq!(err, XPathError::UndefinedPrefix { prefix: "nope".into() });
    }

    #[test]
    fn test_disabled_regexp_extension_is_an_unknown_function() {
        let tree = xml::parse(DOC).unwrap();
        let mut setup = TestSetup::new(&tree);
        setup.options = XPathOptions::default().with_regexp_extension(false);
        setup.namespaces.insert("re", EXSLT_REGEXP_NAMESPACE).unwrap();
        let e_ctx = setup.root_context();

        let err = try_eval_func("re:test", vec![s("abc"), s("b")], &e_ctx).unwrap_err();
        assert_eq!(
            err,
            XPathError::Eval(EvalError::UnknownFunction(format!(
                "{{{EXSLT_REGEXP_NAMESPACE}}}test"
            )))
        );
    }

    #[test]
    fn test_extension_functions() {
        let tree = xml::parse(DOC).unwrap();
        let mut setup = TestSetup::new(&tree);
        setup.namespaces.insert("ex", "urn:ex").unwrap();
        setup.funcs.register(Some("urn:ex"), "double", |_ctx, args| {
            let n = args.first().map(|v| v.to_number()).unwrap_or(0.0);
            Ok(XPathValue::Number(n * 2.0))
        });
        setup.funcs.register(Some("urn:ex"), "fail", |_ctx, _args| Err("boom".into()));
        // Unprefixed extensions shadow core functions.
        setup.funcs.register(None, "true", |_ctx, _args| Ok(XPathValue::Boolean(false)));
        setup.funcs.register(None, "context-name", |ctx, _args| {
            Ok(XPathValue::String(ctx.context_node.qualified_name()))
        });
        let e_ctx = setup.context(setup.element("div"), 1, 1);

        assert_eq!(eval_func("ex:double", vec![21.0.into()], &e_ctx).to_number(), 42.0);
        assert!(!eval_func("true", vec![], &e_ctx).to_bool());
        assert_eq!(eval_func("context-name", vec![], &e_ctx).to_string(), "div");

        let err = try_eval_func("ex:fail", vec![], &e_ctx).unwrap_err();
        assert_eq!(
            err,
            XPathError::Eval(EvalError::ExtensionFailed {
                function: "ex:fail".into(),
                message: "boom".into()
            })
        );
        assert_eq!(setup.funcs.len(), 4);
        assert!(format!("{:?}", setup.funcs).contains("{urn:ex}double"));
    }
}
