use super::{DartRenderer, Delimiters};
use crate::dart::{
    DartFormalParameter, DartFormalParameterList, DartParameterKind, DartTypeAnnotation, DartTypeParameter,
};

impl DartRenderer {
    pub(super) fn type_annotation(&mut self, ty: &DartTypeAnnotation) {
        match ty {
            DartTypeAnnotation::Named {
                name,
                type_arguments,
                nullable,
            } => {
                self.write(name);
                self.join(type_arguments, Delimiters::ANGLE, |r, t| r.type_annotation(t));
                if *nullable {
                    self.write("?");
                }
            }
            DartTypeAnnotation::Function {
                return_type,
                parameters,
                nullable,
            } => {
                self.type_annotation(return_type);
                let delimiters = Delimiters::enclosed(" Function(", ")").or_empty(" Function()");
                self.join(parameters, delimiters, |r, t| r.type_annotation(t));
                if *nullable {
                    self.write("?");
                }
            }
        }
    }

    pub(super) fn type_parameters(&mut self, params: &[DartTypeParameter]) {
        self.join(params, Delimiters::ANGLE, |r, tp| {
            r.write(&tp.name);
            if let Some(bound) = &tp.bound {
                r.write(" extends ");
                r.type_annotation(bound);
            }
        });
    }

    /// `(a, b, [c = 1])` or `(a, {b = 1, required c})`. Optional
    /// parameters are grouped after the required ones.
    pub(super) fn formal_parameters(&mut self, list: &DartFormalParameterList) {
        let (required, optional): (Vec<&DartFormalParameter>, Vec<&DartFormalParameter>) = list
            .parameters
            .iter()
            .partition(|p| p.kind == DartParameterKind::Required);
        let (named, positional): (Vec<&DartFormalParameter>, Vec<&DartFormalParameter>) =
            optional.into_iter().partition(|p| p.kind.is_named());

        self.write("(");
        self.join(&required, Delimiters::COMMA, |r, p| r.formal_parameter(p));
        let mut separated = !required.is_empty();
        for (group, open, close) in [(&positional, "[", "]"), (&named, "{", "}")] {
            if group.is_empty() {
                continue;
            }
            if separated {
                self.write(", ");
            }
            separated = true;
            self.join(group, Delimiters::enclosed(open, close), |r, p| r.formal_parameter(p));
        }
        self.write(")");
    }

    fn formal_parameter(&mut self, param: &DartFormalParameter) {
        if param.kind == DartParameterKind::RequiredNamed {
            self.write("required ");
        }
        if param.is_field_formal {
            self.write("this.");
        } else if let Some(ty) = &param.ty {
            self.type_annotation(ty);
            self.write(" ");
        }
        self.write(&param.name.value());
        if let Some(value) = &param.default_value {
            self.write(" = ");
            self.top_level().expression(value);
        }
    }
}
